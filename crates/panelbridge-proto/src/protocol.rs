//! Fixed protocol constants, expressed as payloads.
//!
//! These byte tables are configuration data dictated by the peer
//! hardware, not values derived at runtime. Checksums are computed when
//! frames are built from them, so the tables stay consistent with the
//! checksum rule in `panelbridge-frame`.

/// Bare bytes the mainboard sends once, before any framed traffic, as
/// soon as the panel starts transmitting.
pub const START_SEQUENCE: [u8; 2] = [0x00, 0xFF];

/// Opens the handshake; its second appearance closes it.
pub const HANDSHAKE_SYN: [u8; 3] = [0x40, 0x01, 0x00];

/// First acknowledgement stage.
pub const ACK_FIRST: [u8; 2] = [0xFF, 0xFF];

/// Second acknowledgement stage.
pub const ACK_SECOND: [u8; 2] = [0xFF, 0xFE];

/// Version request the mainboard sends after the acknowledgement stages.
pub const VERSION_REQUEST: [u8; 5] = [0xFF, 0xFD, 0x06, 0x50, 0x20];

/// The panel's short version-header reply.
pub const VERSION_HEADER: [u8; 3] = [0xFF, 0xFD, 0x06];

/// Identity acknowledgement sent for each panel identity report.
pub const IDENT_ACK: [u8; 2] = [0xFF, 0xFB];

/// Panel identity report: 0xFF 0xFB followed by the model string
/// "RM EC4_V1.00_2020(200930)".
pub const PANEL_IDENT: [u8; 27] = [
    0xFF, 0xFB, 0x52, 0x4D, 0x20, 0x45, 0x43, 0x34, 0x5F, 0x56, 0x31, 0x2E, 0x30, 0x30, 0x5F,
    0x32, 0x30, 0x32, 0x30, 0x28, 0x32, 0x30, 0x30, 0x39, 0x33, 0x30, 0x29,
];

/// Final acknowledgement before the closing SYN.
pub const FINAL_ACK: [u8; 2] = [0x00, 0x00];

/// Button-poll request the mainboard repeats every cycle.
pub const POLL_REQUEST: [u8; 2] = [0x50, 0x62];

/// Link heartbeat the mainboard repeats every cycle.
pub const HEARTBEAT: [u8; 5] = [0x50, 0x84, 0x00, 0x01, 0x01];

/// Button report payloads the panel sends (one 0x02 position per button).
pub const BUTTON_DAY_A: [u8; 15] = [
    0x50, 0x62, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];
pub const BUTTON_DAY_B: [u8; 15] = [
    0x50, 0x62, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];
pub const BUTTON_OK: [u8; 15] = [
    0x50, 0x62, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];
pub const BUTTON_CLOCK: [u8; 15] = [
    0x50, 0x62, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Status payload with every display segment lit.
pub const STATUS_DEFAULT: [u8; 21] = [
    0x50, 0x8E, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20,
    0x20, 0x20, 0x20, 0x20, 0x20, 0x00,
];

/// Status payload lighting only the day-A segment.
pub const STATUS_DAY_A: [u8; 21] = [
    0x50, 0x8E, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Status payload lighting only the day-B segment.
pub const STATUS_DAY_B: [u8; 21] = [
    0x50, 0x8E, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Status payload lighting only the clock digits.
pub const STATUS_CLOCK: [u8; 21] = [
    0x50, 0x8E, 0x00, 0x00, 0x00, 0x00, 0x20, 0x20, 0x20, 0x20, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];
