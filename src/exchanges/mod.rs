pub mod lbank;
