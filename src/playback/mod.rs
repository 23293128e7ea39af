//! Frame stepping over a half-open range and wall-clock pacing between presented frames.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Time source for pacing; injectable so ticks can be simulated.
pub trait Clock {
    /// Monotonic time since an arbitrary origin.
    fn now(&self) -> Duration;
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Clock that only moves when told to; `sleep` advances it instantly.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
    slept: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates work (decoding, drawing) that takes `duration`.
    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }

    pub fn total_slept(&self) -> Duration {
        self.slept.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.slept.set(self.slept.get() + duration);
        self.advance(duration);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Holds presentation back until `reference + delay`, then moves the reference to the
/// moment of release so work done between frames is not charged twice.
#[derive(Debug)]
pub struct PlaybackClock<C> {
    clock: C,
    delay: Duration,
    reference: Duration,
}

impl<C: Clock> PlaybackClock<C> {
    pub fn new(clock: C, delay: Duration) -> Self {
        let reference = clock.now();
        Self {
            clock,
            delay,
            reference,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn restart(&mut self) {
        self.reference = self.clock.now();
    }

    /// Time left until the next frame is due.
    pub fn remaining(&self) -> Duration {
        (self.reference + self.delay).saturating_sub(self.clock.now())
    }

    pub fn wait(&mut self) {
        let remaining = self.remaining();
        if !remaining.is_zero() {
            self.clock.sleep(remaining);
        }
        self.reference = self.clock.now();
    }
}

/// Half-open `[first, end)` range of frames that playback may show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRange {
    pub first: u64,
    pub end: u64,
}

impl FrameRange {
    pub fn new(first: u64, end: u64) -> Option<Self> {
        (first < end).then_some(Self { first, end })
    }

    pub fn full(frame_count: u64) -> Self {
        Self {
            first: 0,
            end: frame_count.max(1),
        }
    }

    pub const fn last(&self) -> u64 {
        self.end - 1
    }

    pub const fn len(&self) -> u64 {
        self.end - self.first
    }

    pub const fn is_empty(&self) -> bool {
        self.end <= self.first
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStop {
    ReachedEnd,
    BeforeStart,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playback {
    range: FrameRange,
    frame: i64,
    playing: bool,
}

impl Playback {
    pub fn new(range: FrameRange, playing: bool) -> Self {
        Self {
            range,
            frame: to_signed(range.first),
            playing,
        }
    }

    pub fn range(&self) -> FrameRange {
        self.range
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn current_frame(&self) -> u64 {
        u64::try_from(self.frame).unwrap_or(self.range.first)
    }

    /// Flips play/pause and reports the new state.
    pub fn toggle(&mut self) -> bool {
        self.playing = !self.playing;
        self.playing
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn step(&mut self, delta: i64) {
        self.frame = self.frame.saturating_add(delta);
    }

    pub fn go_first(&mut self) {
        self.frame = to_signed(self.range.first);
    }

    pub fn go_last(&mut self) {
        self.frame = to_signed(self.range.last());
    }

    pub fn seek(&mut self, frame: u64) {
        self.frame = to_signed(frame);
    }

    /// One loop tick: moves forward while playing, then clamps into the range.
    /// Leaving the range on either side stops playback.
    pub fn advance(&mut self) -> Option<PlaybackStop> {
        if self.playing {
            self.frame = self.frame.saturating_add(1);
        }
        self.clamp()
    }

    pub fn clamp(&mut self) -> Option<PlaybackStop> {
        if self.frame >= to_signed(self.range.end) {
            self.playing = false;
            self.frame = to_signed(self.range.last());
            Some(PlaybackStop::ReachedEnd)
        } else if self.frame < to_signed(self.range.first) {
            self.playing = false;
            self.frame = to_signed(self.range.first);
            Some(PlaybackStop::BeforeStart)
        } else {
            None
        }
    }
}

fn to_signed(frame: u64) -> i64 {
    i64::try_from(frame).unwrap_or(i64::MAX)
}
