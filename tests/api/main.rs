mod helpers;
mod weather;
