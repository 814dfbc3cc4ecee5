pub mod btc;
