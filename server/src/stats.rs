//! Counters emitted by the core for the external stats collector. The core
//! only accumulates; reporting cadence is up to whoever reads them.

use log::debug;
use std::time::Duration;

#[derive(Debug, Default, Clone)]
pub struct Stats {
    pub messages_sent: u64,
    pub bytes_sent: u64,
    pub messages_received: u64,
    pub bytes_received: u64,
    pub players_joined: u64,
    pub players_left: u64,
    pub invalid_messages: u64,
    pub ticks: u64,
    pub last_tick_duration: Duration,
}

impl Stats {
    pub fn record_sent(&mut self, bytes: usize) {
        self.messages_sent += 1;
        self.bytes_sent += bytes as u64;
    }

    pub fn record_received(&mut self, bytes: usize) {
        self.messages_received += 1;
        self.bytes_received += bytes as u64;
    }

    pub fn record_invalid(&mut self) {
        self.invalid_messages += 1;
    }

    pub fn record_tick(&mut self, duration: Duration) {
        self.ticks += 1;
        self.last_tick_duration = duration;
    }

    pub fn log_summary(&self, players: usize) {
        debug!(
            "Tick {}: {} players, sent {} msgs / {} bytes, recv {} msgs / {} bytes, \
             {} invalid, last tick took {:?}",
            self.ticks,
            players,
            self.messages_sent,
            self.bytes_sent,
            self.messages_received,
            self.bytes_received,
            self.invalid_messages,
            self.last_tick_duration,
        );
    }
}
