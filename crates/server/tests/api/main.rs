mod base_fee;
mod extra_fee;
mod fee;
mod helpers;
mod weather;
