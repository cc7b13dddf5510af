//! Handshake negotiation state machine.
//!
//! The panel drives the exchange: it opens with a SYN frame, walks a
//! fixed sequence of acknowledgements and identity reports, and closes
//! by repeating the SYN. The engine matches each received frame against
//! an ordered table of expected messages and emits the paired response
//! at most once per table entry. The same byte pattern may appear more
//! than once in the table for different protocol phases; firing order
//! alone disambiguates them.

use std::time::Duration;

use panelbridge_frame::{Frame, Result};

use crate::protocol;

/// Delay before restarting a failed handshake attempt.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(3000);

/// What the engine does with a matched table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Transmit this frame and keep negotiating.
    Frame(Frame),
    /// Negotiation is complete; nothing is transmitted.
    ///
    /// The original wire tables encode this as a single 0x00 byte that
    /// never leaves the device.
    Complete,
}

/// Externally observable negotiation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Idle,
    Negotiating,
    Succeeded,
}

/// Outcome of feeding one frame to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// An entry fired; transmit this response.
    Respond(Frame),
    /// The completion entry fired; the handshake succeeded.
    Complete,
    /// No unfired entry matched; this attempt has failed and the caller
    /// should retry after [`DEFAULT_RETRY_DELAY`].
    Mismatch,
}

#[derive(Debug)]
struct Entry {
    expected: Frame,
    reply: Reply,
    fired: bool,
}

/// Ordered once-only matcher over the handshake table.
///
/// The engine never initiates traffic; the peer resends its opening
/// message when negotiation stalls, so a failed attempt is simply reset
/// and replayed.
#[derive(Debug)]
pub struct HandshakeEngine {
    entries: Vec<Entry>,
    state: HandshakeState,
}

impl HandshakeEngine {
    /// Build the engine over the standard panel exchange.
    pub fn standard() -> Result<Self> {
        let pairs = [
            (&protocol::HANDSHAKE_SYN[..], Some(&protocol::ACK_FIRST[..])),
            (&protocol::ACK_FIRST[..], Some(&protocol::ACK_SECOND[..])),
            (&protocol::ACK_SECOND[..], Some(&protocol::VERSION_REQUEST[..])),
            (&protocol::VERSION_HEADER[..], Some(&protocol::IDENT_ACK[..])),
            (&protocol::PANEL_IDENT[..], Some(&protocol::IDENT_ACK[..])),
            (&protocol::PANEL_IDENT[..], Some(&protocol::FINAL_ACK[..])),
            (&protocol::HANDSHAKE_SYN[..], None),
        ];

        let mut table = Vec::with_capacity(pairs.len());
        for (expected, reply) in pairs {
            let reply = match reply {
                Some(payload) => Reply::Frame(Frame::from_payload(payload)?),
                None => Reply::Complete,
            };
            table.push((Frame::from_payload(expected)?, reply));
        }
        Ok(Self::from_pairs(table))
    }

    /// Build an engine over an arbitrary ordered table.
    pub fn from_pairs(pairs: Vec<(Frame, Reply)>) -> Self {
        Self {
            entries: pairs
                .into_iter()
                .map(|(expected, reply)| Entry {
                    expected,
                    reply,
                    fired: false,
                })
                .collect(),
            state: HandshakeState::Idle,
        }
    }

    /// Current negotiation state.
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Start a fresh attempt: clear all fired flags and enter
    /// `Negotiating`. Called at startup and after each failed attempt.
    pub fn reset_attempt(&mut self) {
        for entry in &mut self.entries {
            entry.fired = false;
        }
        self.state = HandshakeState::Negotiating;
        tracing::debug!("handshake attempt started");
    }

    /// Match one received frame against the table.
    ///
    /// The first unfired entry whose expected bytes equal the received
    /// frame fires exactly once. No match means the attempt failed; the
    /// table is left untouched until the next [`reset_attempt`].
    ///
    /// [`reset_attempt`]: Self::reset_attempt
    pub fn on_frame(&mut self, frame: &Frame) -> Step {
        if self.state != HandshakeState::Negotiating {
            tracing::warn!(state = ?self.state, "handshake frame outside negotiation");
            return Step::Mismatch;
        }

        let matched = self
            .entries
            .iter_mut()
            .find(|entry| !entry.fired && entry.expected.as_bytes() == frame.as_bytes());

        let Some(entry) = matched else {
            tracing::warn!(frame = %frame, "unknown or out-of-order handshake frame");
            return Step::Mismatch;
        };

        entry.fired = true;
        match &entry.reply {
            Reply::Complete => {
                self.state = HandshakeState::Succeeded;
                tracing::info!("handshake succeeded");
                Step::Complete
            }
            Reply::Frame(reply) => Step::Respond(reply.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(payload: &[u8]) -> Frame {
        Frame::from_payload(payload).unwrap()
    }

    fn standard_negotiating() -> HandshakeEngine {
        let mut engine = HandshakeEngine::standard().unwrap();
        engine.reset_attempt();
        engine
    }

    #[test]
    fn starts_idle() {
        let engine = HandshakeEngine::standard().unwrap();
        assert_eq!(engine.state(), HandshakeState::Idle);
    }

    #[test]
    fn full_exchange_in_order_succeeds() {
        let mut engine = standard_negotiating();

        let script = [
            (&protocol::HANDSHAKE_SYN[..], Some(&protocol::ACK_FIRST[..])),
            (&protocol::ACK_FIRST[..], Some(&protocol::ACK_SECOND[..])),
            (&protocol::ACK_SECOND[..], Some(&protocol::VERSION_REQUEST[..])),
            (&protocol::VERSION_HEADER[..], Some(&protocol::IDENT_ACK[..])),
            (&protocol::PANEL_IDENT[..], Some(&protocol::IDENT_ACK[..])),
            (&protocol::PANEL_IDENT[..], Some(&protocol::FINAL_ACK[..])),
            (&protocol::HANDSHAKE_SYN[..], None),
        ];

        for (incoming, expected_reply) in script {
            let step = engine.on_frame(&frame(incoming));
            match expected_reply {
                Some(payload) => assert_eq!(step, Step::Respond(frame(payload))),
                None => assert_eq!(step, Step::Complete),
            }
        }

        assert_eq!(engine.state(), HandshakeState::Succeeded);
    }

    #[test]
    fn duplicate_pattern_disambiguated_by_firing_order() {
        // PANEL_IDENT appears twice in the table with different replies;
        // the first sighting gets IDENT_ACK, the second FINAL_ACK.
        let mut engine = standard_negotiating();
        engine.on_frame(&frame(&protocol::HANDSHAKE_SYN));
        engine.on_frame(&frame(&protocol::ACK_FIRST));
        engine.on_frame(&frame(&protocol::ACK_SECOND));
        engine.on_frame(&frame(&protocol::VERSION_HEADER));

        let first = engine.on_frame(&frame(&protocol::PANEL_IDENT));
        let second = engine.on_frame(&frame(&protocol::PANEL_IDENT));

        assert_eq!(first, Step::Respond(frame(&protocol::IDENT_ACK)));
        assert_eq!(second, Step::Respond(frame(&protocol::FINAL_ACK)));
    }

    #[test]
    fn fired_entry_does_not_refire() {
        let mut engine = standard_negotiating();

        let ack = frame(&protocol::ACK_FIRST);
        engine.on_frame(&frame(&protocol::HANDSHAKE_SYN));
        assert_eq!(
            engine.on_frame(&ack),
            Step::Respond(frame(&protocol::ACK_SECOND))
        );

        // ACK_FIRST has only one table entry; the repeat must not resend.
        assert_eq!(engine.on_frame(&ack), Step::Mismatch);
        assert_eq!(engine.state(), HandshakeState::Negotiating);
    }

    #[test]
    fn unknown_frame_fails_attempt_and_reset_clears_flags() {
        let mut engine = standard_negotiating();
        engine.on_frame(&frame(&protocol::HANDSHAKE_SYN));

        assert_eq!(engine.on_frame(&frame(&[0xDE, 0xAD])), Step::Mismatch);

        // Fresh attempt starts from a clean table: the opening SYN
        // matches entry 0 again, not the completion entry.
        engine.reset_attempt();
        assert_eq!(
            engine.on_frame(&frame(&protocol::HANDSHAKE_SYN)),
            Step::Respond(frame(&protocol::ACK_FIRST))
        );
    }

    #[test]
    fn completion_transmits_nothing() {
        let mut engine = standard_negotiating();
        for payload in [
            &protocol::HANDSHAKE_SYN[..],
            &protocol::ACK_FIRST[..],
            &protocol::ACK_SECOND[..],
            &protocol::VERSION_HEADER[..],
            &protocol::PANEL_IDENT[..],
            &protocol::PANEL_IDENT[..],
        ] {
            assert!(matches!(engine.on_frame(&frame(payload)), Step::Respond(_)));
        }

        assert_eq!(
            engine.on_frame(&frame(&protocol::HANDSHAKE_SYN)),
            Step::Complete
        );
    }

    #[test]
    fn frames_outside_negotiation_mismatch() {
        let mut engine = HandshakeEngine::standard().unwrap();
        assert_eq!(
            engine.on_frame(&frame(&protocol::HANDSHAKE_SYN)),
            Step::Mismatch
        );
    }

    #[test]
    fn custom_table_respected() {
        let mut engine = HandshakeEngine::from_pairs(vec![
            (frame(&[0x01]), Reply::Frame(frame(&[0x02]))),
            (frame(&[0x01]), Reply::Complete),
        ]);
        engine.reset_attempt();

        assert_eq!(
            engine.on_frame(&frame(&[0x01])),
            Step::Respond(frame(&[0x02]))
        );
        assert_eq!(engine.on_frame(&frame(&[0x01])), Step::Complete);
        assert_eq!(engine.state(), HandshakeState::Succeeded);
    }
}
