//! Network epoch and forging slot arithmetic
//!
//! Transaction and block timestamps count seconds since the network
//! epoch, not the unix epoch. Slots partition that timeline into
//! fixed-length forging windows; the block verifier rejects blocks whose
//! slot lies in the future.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{ChainError, Result};

/// Seconds since the network epoch, right now
pub fn epoch_time(epoch_unix_seconds: u64) -> Result<u32> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| ChainError::Crypto(format!("System time error: {e}")))?
        .as_secs();

    if now < epoch_unix_seconds {
        return Err(ChainError::Crypto(
            "System clock is before the network epoch".to_string(),
        ));
    }

    let elapsed = now - epoch_unix_seconds;
    if elapsed > u32::MAX as u64 {
        return Err(ChainError::Crypto("Timestamp overflow".to_string()));
    }
    Ok(elapsed as u32)
}

/// Slot index for an epoch timestamp
pub fn slot_number(timestamp: u32, blocktime: u32) -> u32 {
    timestamp / blocktime
}

/// Slot index for the current wall clock
pub fn current_slot(epoch_unix_seconds: u64, blocktime: u32) -> Result<u32> {
    Ok(slot_number(epoch_time(epoch_unix_seconds)?, blocktime))
}
