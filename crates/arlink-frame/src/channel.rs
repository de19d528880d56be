//! Protocol channel (buffer) IDs.
//!
//! These are fixed by the device firmware and are not negotiable. Outbound
//! channels are controller-to-device ("c2d"), inbound are device-to-controller
//! ("d2c"). Setting bit 0x80 on a data channel yields the channel that
//! carries acknowledgments for it.

/// Heartbeat ping; the receiver bounces the payload back on [`PONG`].
pub const PING: u8 = 0;

/// Heartbeat pong carrying the echoed ping payload.
pub const PONG: u8 = 1;

/// Outbound commands, fire-and-forget.
pub const C2D_COMMAND: u8 = 10;

/// Outbound commands requiring an acknowledgment.
pub const C2D_COMMAND_WITH_ACK: u8 = 11;

/// Outbound emergency commands.
pub const C2D_EMERGENCY: u8 = 12;

/// Outbound video stream acknowledgments (reserved, not produced).
pub const C2D_STREAM_ACK: u8 = 13;

/// Inbound commands.
pub const D2C_COMMAND: u8 = 127;

/// Inbound commands the device expects us to acknowledge.
pub const D2C_COMMAND_WITH_ACK: u8 = 126;

/// Inbound video stream (reserved, not processed).
pub const D2C_STREAM: u8 = 125;

/// Bit marking a channel as the acknowledgment counterpart of a data channel.
pub const ACK_FLAG: u8 = 0x80;

/// Acknowledgment channel for a data channel.
pub fn ack_channel(data_channel: u8) -> u8 {
    data_channel | ACK_FLAG
}

/// Data channel an acknowledgment channel refers to.
pub fn data_channel(ack_channel: u8) -> u8 {
    ack_channel & !ACK_FLAG
}

/// Returns true if the channel carries acknowledgments.
pub fn is_ack_channel(id: u8) -> bool {
    id & ACK_FLAG != 0
}

/// Returns true if the channel carries inbound commands.
pub fn is_command_channel(id: u8) -> bool {
    matches!(id, D2C_COMMAND | D2C_COMMAND_WITH_ACK)
}

/// Returns a human-readable name for a channel ID.
pub fn channel_name(id: u8) -> &'static str {
    match id {
        PING => "PING",
        PONG => "PONG",
        C2D_COMMAND => "C2D_COMMAND",
        C2D_COMMAND_WITH_ACK => "C2D_COMMAND_WITH_ACK",
        C2D_EMERGENCY => "C2D_EMERGENCY",
        C2D_STREAM_ACK => "C2D_STREAM_ACK",
        D2C_COMMAND => "D2C_COMMAND",
        D2C_COMMAND_WITH_ACK => "D2C_COMMAND_WITH_ACK",
        D2C_STREAM => "D2C_STREAM",
        id if is_ack_channel(id) => "ACK",
        _ => "UNKNOWN",
    }
}
