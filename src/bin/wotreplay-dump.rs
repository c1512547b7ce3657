//!
//! # wotreplay-dump
//!
//! Decodes a `.wotreplay` recording and prints what it finds: a one line
//! battle summary from the metadata preamble and, unless `--head-only` is
//! given, every decoded packet as a JSON line on stdout.
//!

use env_logger::Env;
use log::*;
use std::path::PathBuf;
use structopt::StructOpt;
use wotreplay::replay::model::Replay;

/// Dump the contents of a .wotreplay recording
#[derive(StructOpt, Debug)]
#[structopt(name = "wotreplay-dump")]
struct Opt {
    /// The recording to decode
    #[structopt(parse(from_os_str))]
    replay: PathBuf,
    /// Only parse the metadata preamble, skipping the decryption
    #[structopt(long)]
    head_only: bool,
}

fn main() -> wotreplay::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let opt = Opt::from_args();
    let buf = match std::fs::read(&opt.replay) {
        Ok(buf) => buf,
        Err(e) => {
            error!("Unable to read {}: {}", opt.replay.display(), e);
            std::process::exit(1);
        }
    };

    if opt.head_only {
        let head = Replay::head_from_slice(&buf).map_err(wotreplay::Error::from)?;
        print_head(&head);
        return Ok(());
    }

    let replay = Replay::from_slice(&buf).map_err(wotreplay::Error::from)?;
    print_head(&replay.head);

    let decode = replay.gameplay.decode().map_err(wotreplay::Error::from)?;
    if decode.trailing_bytes > 0 {
        warn!(
            "Recording is cut off; {} trailing bytes dropped",
            decode.trailing_bytes
        );
    }
    info!("{} packets", decode.packets.len());
    for packet in &decode.packets {
        // Serialising a decoded packet cannot fail, every value is a tree
        // of plain data
        println!("{}", serde_json::to_string(packet).unwrap());
    }

    Ok(())
}

fn print_head(head: &wotreplay::replay::model::ReplayHead) {
    if head.skipped_documents > 0 {
        warn!("{} metadata documents skipped", head.skipped_documents);
    }
    info!(
        "map: {}, player: {}, won: {:?}, full match: {}",
        head.map_display_name().unwrap_or("?"),
        head.player_name().unwrap_or("?"),
        head.is_player_win(),
        head.is_full_match(),
    );
}
