//! BTC Adaptor

#![deny(
	// clippy::all,
	missing_docs,
	unused_crate_dependencies,
	// warnings,
)]

mod chain;
mod conf;
mod error;
mod http;
mod service;
mod types;

mod prelude {
	pub use crate::error::*;

	pub type Result<T> = std::result::Result<T, Error>;
}

// std
use std::path::PathBuf;
// crates.io
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "btc-adaptor")]
#[command(version, about = "Balances, history and unsigned transfers for a Bitcoin address.")]
struct Cli {
	/// Configuration file, defaults to the user config directory.
	#[arg(short, long)]
	conf: Option<PathBuf>,
	#[command(subcommand)]
	command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
	/// Sum of the spendable outputs of an address.
	Balance {
		address: String,
		#[arg(short, long, default_value = "1")]
		min_confirmations: u64,
	},
	/// Spendable outputs of an address.
	Utxos {
		address: String,
		#[arg(short, long, default_value = "1")]
		min_confirmations: u64,
	},
	/// Recent transactions of an address with their balance deltas.
	History {
		address: String,
		#[arg(short, long, default_value = "10")]
		count: u32,
	},
	/// Assemble an unsigned transfer.
	Transfer {
		#[arg(short, long)]
		from: String,
		#[arg(short, long)]
		to: String,
		/// In satoshi.
		#[arg(short, long)]
		amount: u64,
		/// Hex encoded `consumed_refs` of earlier transfers not yet seen by the node.
		#[arg(short, long)]
		exclude: Option<String>,
	},
	/// Decode a hex encoded raw transaction.
	Inspect { tx: String },
	/// Hash a hex encoded raw transaction.
	TxHash { tx: String },
	/// Sender, recipient, amount and fee of a transaction.
	TransferInfo { txid: String },
	/// Block metadata, the latest block unless one is given.
	Block {
		#[arg(long, conflicts_with = "id")]
		height: Option<u64>,
		#[arg(long)]
		id: Option<String>,
	},
}

fn main() -> prelude::Result<()> {
	color_eyre::install().unwrap();
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.with_writer(std::io::stderr)
		.init();

	let Cli { conf, command } = Cli::parse();

	service::run(conf, command)
}
