//! Producer-facing channels
//!
//! - [`SamplingRegister`] - mutex-guarded last-value slot
//! - [`LastIntervalChannel`] - forwards the most recent value on a fixed cadence

mod interval;
mod register;

pub use interval::{ChannelStats, Consumer, LastIntervalChannel};
pub use register::SamplingRegister;

/// Write side of a channel
pub trait Channel<T>: Send + Sync {
    /// Hand a message to the channel
    fn send(&self, message: T);
}
