//! # Talker CLI
//!
//! A test client: connects to a [`Listener`](slotdb::daemon), sends one
//! framed `DB_READ`/`DB_WRITE`/`TEXT` request, and prints the response
//! (drives C6 plus a client-side outbound connection). Thin glue; see spec
//! §6.6.

use std::net::TcpStream;
use std::process;

use clap::{Args, Parser, Subcommand};

use slotdb::error::exit_code_for;
use slotdb::wire::codec;
use slotdb::wire::frame::{Connection, DataType, Frame, WireOfri};

/// Sends one request to a running listener and prints whatever it sends
/// back.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Listener address.
    #[arg(short, long, default_value = "127.0.0.1")]
    address: String,
    /// Listener port.
    #[arg(short, long)]
    port: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sends a `DB_READ` request and prints the field bytes that come back.
    Read(OfriArgs),
    /// Sends a `DB_WRITE` request.
    Write(WriteArgs),
    /// Sends a `TEXT` frame.
    Text {
        /// The message to send.
        message: String,
    },
}

#[derive(Args)]
struct OfriArgs {
    /// Numeric `object_number` from the manifest.
    object_number: u32,
    /// Field ordinal.
    field: u32,
    /// Record index.
    record: u32,
    /// Element index within the field.
    index: u32,
}

#[derive(Args)]
struct WriteArgs {
    #[command(flatten)]
    ofri: OfriArgs,
    /// Raw value bytes to write, taken verbatim from the argument's UTF-8
    /// encoding.
    value: String,
}

fn wire_ofri(args: &OfriArgs) -> WireOfri {
    WireOfri {
        object_number: args.object_number,
        field: args.field,
        record: args.record,
        index: args.index,
    }
}

fn main() {
    slotdb::logging::init();
    let cli = Cli::parse();

    let port: u16 = match cli.port.parse() {
        Ok(p) => p,
        Err(_) => {
            eprintln!("invalid port: {}", cli.port);
            process::exit(exitcode::USAGE);
        }
    };

    let mut stream = match TcpStream::connect((cli.address.as_str(), port)) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("failed to connect to {}:{}: {e}", cli.address, cli.port);
            process::exit(exitcode::UNAVAILABLE);
        }
    };

    let connection = match stream.local_addr() {
        Ok(addr) => Connection::new(addr.ip().to_string(), addr.port().to_string()),
        Err(_) => Connection::new("", ""),
    };

    let frame = match &cli.command {
        Command::Read(args) => Frame::db_read(connection, wire_ofri(args).to_bytes().to_vec()),
        Command::Write(args) => Frame::db_write(connection, wire_ofri(&args.ofri), args.value.as_bytes()),
        Command::Text { message } => Frame::text(connection, message),
    };
    let awaits_response = matches!(frame.data_type, DataType::DbRead);

    if let Err(e) = codec::send(&mut stream, &frame) {
        eprintln!("failed to send frame: {e}");
        process::exit(exit_code_for(e.code()));
    }

    if awaits_response {
        match codec::recv(&mut stream) {
            Ok(response) => println!("{:?}", response.payload),
            Err(e) => {
                eprintln!("failed to read response: {e}");
                process::exit(exit_code_for(e.code()));
            }
        }
    }
}
