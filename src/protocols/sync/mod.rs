//! # Sync protocol
//! Keeps replicas of a turnless game consistent with a single authority.
//!
//! ## Constraints and guarantees
//! - the authority is the **only source of truth**, replicas never apply a move before it is confirmed
//! - every confirmed move carries the **game clock time** it was played at, and replicas stamp pieces with that time
//! - a replica that cannot apply a confirmation **drops its game and asks for a snapshot**
//! - cooldowns are enforced by the authority with its own clock, replicas only check them to avoid useless requests
//!
//! ## Transport
//! Messages are JSON objects, **one per line**. The host reads envelopes
//! (`{"player": ..., "type": ..., ...}`) and writes outbound messages carrying
//! the game identifier and, for replies meant for a single player, a `to` field.

use std::{
    io::{Read, Write},
    sync::{Mutex, PoisonError},
};

use serde::{Deserialize, Serialize};

pub mod authority;
pub mod endpoint;
pub mod messages;
pub mod replica;

use authority::{Authority, Clock, GameConfig, SystemClock};
use endpoint::{EndpointError, SyncReader, SyncWriter};
use messages::{ClientMessage, PlayerId};

/// A client message along with the player who sent it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub player: PlayerId,
    #[serde(flatten)]
    pub message: ClientMessage,
}

/// Hosts games over standard I/O until the input ends.
pub fn sync_host(config: GameConfig) -> Result<(), EndpointError> {
    let authority = Mutex::new(Authority::new(SystemClock::new(), config));
    run_host(std::io::stdin(), std::io::stdout(), &authority)
}

/// Serves envelopes read from `input`, writing replies to `output`.
///
/// Malformed lines are reported and skipped.
pub fn run_host<I: Read, O: Write, C: Clock>(
    input: I,
    output: O,
    authority: &Mutex<Authority<C>>,
) -> Result<(), EndpointError> {
    let mut reader = SyncReader::new(input);
    let mut writer = SyncWriter::new(output);

    loop {
        let envelope = match reader.read_message::<Envelope>() {
            Ok(Some(envelope)) => envelope,
            Ok(None) => break,
            Err(EndpointError::Json(e)) => {
                log::warn!("skipping malformed message: {e}");
                continue;
            }
            Err(e) => return Err(e),
        };
        log::debug!("{} sent {:?}", envelope.player, envelope.message);

        let outbound = {
            let mut authority = authority.lock().unwrap_or_else(PoisonError::into_inner);
            let outbound = authority.handle(&envelope.player, envelope.message);
            authority.expire_idle();
            outbound
        };
        for message in &outbound {
            writer.send_message(message)?;
        }
    }
    log::info!("input closed, host stopping");
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use authority::ManualClock;

    #[test]
    fn envelopes_flatten_the_message() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"player":"alice","type":"join","game_id":"g"}"#).unwrap();
        assert_eq!(
            envelope,
            Envelope {
                player: "alice".to_string(),
                message: ClientMessage::Join {
                    game_id: "g".to_string()
                }
            }
        );
    }

    #[test]
    fn host_replies_line_by_line() {
        let input = [
            r#"{"player":"alice","type":"create","game_id":"g","cooldown":0}"#,
            r#"{"player":"alice","type":"join","game_id":"g"}"#,
            "garbage",
            r#"{"player":"bob","type":"join","game_id":"g"}"#,
            r#"{"player":"alice","type":"move_request","game_id":"g","move":{"from":"e2","to":"e4"}}"#,
            r#"{"player":"bob","type":"move_request","game_id":"g","move":{"from":"e2","to":"e4"}}"#,
        ]
        .join("\n");
        let authority = Mutex::new(Authority::new(ManualClock::new(0), GameConfig::default()));
        let mut output = vec![];
        run_host(input.as_bytes(), &mut output, &authority).unwrap();

        let lines: Vec<serde_json::Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        let types: Vec<&str> = lines
            .iter()
            .map(|line| line["type"].as_str().unwrap())
            .collect();
        assert_eq!(
            types,
            ["created", "snapshot", "snapshot", "snapshot", "move_confirm", "move_rejected"]
        );
        assert_eq!(lines[1]["to"], "alice");
        assert_eq!(lines[1]["colour"], "w");
        assert_eq!(lines[2]["to"], "bob");
        assert_eq!(lines[2]["colour"], "b");
        assert_eq!(lines[3]["to"], "alice");
        assert_eq!(lines[3]["colour"], "w");
        assert!(lines[4].get("to").is_none());
        assert_eq!(lines[4]["move"]["to"], "e4");
        assert_eq!(lines[5]["to"], "bob");

        let authority = authority.into_inner().unwrap();
        assert_eq!(
            authority.game("g").unwrap().game().nfen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR KQkq 2"
        );
    }
}
