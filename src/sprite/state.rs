//! Runtime side of an animation: one play-head walking a shared
//! [`FrameSequence`] template.
//!
//! ┌──────────────── Playback State Flow ────────────────────┐
//! │  From State  →  Call     →  To State                    │
//! ├─────────────────────────────────────────────────────────┤
//! │  (new)       →  create   →  Stopped | Playing(autostart)│
//! │  any         →  play     →  Playing                     │
//! │  any         →  pause    →  Paused                      │
//! │  any         →  stop     →  Stopped (play-head rewound) │
//! │  -------        ------                                  │
//! │  Playing     →  advance  →  Playing (one step)          │
//! │  Playing     →  advance  →  Paused  (Freeze, last loop) │
//! └─────────────────────────────────────────────────────────┘

use crate::sprite::{FrameSequence, PlaybackMode};
use std::rc::Rc;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// What happens once a finite loop count has been played through.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum LoopPolicy {
    /// loop counter goes back to 0 and playback carries on
    #[default]
    Restart,
    /// hold the end-of-cycle frame and pause
    Freeze,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct AdvanceResult {
    /// a loop boundary was crossed by this step
    pub looped: bool,
    /// the step completed the last of a finite number of loops
    pub completed: bool,
}

#[derive(Debug, Clone)]
pub struct AnimationInstance {
    // shared template, never written through the instance
    sequence: Rc<FrameSequence>,
    index: usize,
    loop_count: u32,
    state: PlaybackState,
    // only read in PingPong mode
    backwards: bool,
    fps: f64,
    elapsed: f64,
    policy: LoopPolicy,
    finished: bool,
}

impl AnimationInstance {
    pub fn new(sequence: Rc<FrameSequence>, auto_start: bool) -> Self {
        AnimationInstance {
            index: sequence.start_index(),
            fps: sequence.fps(),
            sequence,
            loop_count: 0,
            state: if auto_start {
                PlaybackState::Playing
            } else {
                PlaybackState::Stopped
            },
            backwards: false,
            elapsed: 0.0,
            policy: LoopPolicy::default(),
            finished: false,
        }
    }

    pub fn with_policy(mut self, policy: LoopPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn set_policy(&mut self, policy: LoopPolicy) {
        self.policy = policy;
    }

    pub fn policy(&self) -> LoopPolicy {
        self.policy
    }

    pub fn sequence(&self) -> &Rc<FrameSequence> {
        &self.sequence
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// play-head position inside the sequence
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    /// Raw frame value under the play-head (0 for an empty sequence)
    pub fn current_frame(&self) -> u32 {
        self.sequence.frame(self.index)
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// seconds a frame should stay on screen at the current rate
    pub fn frame_duration(&self) -> f64 {
        1.0 / self.fps
    }

    /// seconds spent in effective `advance` calls since the last stop
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Override the playback speed of this instance only. Rejected values
    /// leave the current rate untouched.
    pub fn set_frame_rate(&mut self, fps: f64) {
        if fps.is_finite() && fps > 0.0 {
            self.fps = fps;
        } else {
            log::warn!(
                "{}: ignoring frame rate {}, keeping {}",
                self.sequence.name(),
                fps,
                self.fps
            );
        }
    }

    pub fn play(&mut self) {
        if self.finished {
            self.rewind();
        }
        self.state = PlaybackState::Playing;
    }

    pub fn pause(&mut self) {
        self.state = PlaybackState::Paused;
    }

    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.rewind();
    }

    /// Step the play-head once.
    ///
    /// The step doesn't depend on `dt`: each call is one discrete tick and
    /// the caller decides the cadence (see `frame_duration`). `dt` is only
    /// added to `elapsed`.
    pub fn advance(&mut self, dt: f64) -> AdvanceResult {
        // an empty sequence is a permanent no-op, not an error
        if self.state != PlaybackState::Playing || self.sequence.is_empty() {
            return AdvanceResult::default();
        }
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }

        let count = self.sequence.count();
        let looped = match self.sequence.mode() {
            PlaybackMode::Forward => {
                self.index = (self.index + 1) % count;
                self.index == 0
            }
            PlaybackMode::Backward => {
                if self.index == 0 {
                    self.index = count - 1;
                    true
                } else {
                    self.index -= 1;
                    false
                }
            }
            PlaybackMode::Static => false,
            PlaybackMode::PingPong => self.ping_pong(count),
        };

        if looped {
            self.on_loop()
        } else {
            AdvanceResult::default()
        }
    }

    /// Round trip 0 -> last -> 0, the boundary fires once when back on 0
    fn ping_pong(&mut self, count: usize) -> bool {
        if count == 1 {
            return true;
        }
        if self.backwards {
            self.index = self.index.saturating_sub(1);
            if self.index == 0 {
                self.backwards = false;
                return true;
            }
        } else {
            self.index += 1;
            if self.index >= count - 1 {
                self.backwards = true;
            }
        }
        false
    }

    fn on_loop(&mut self) -> AdvanceResult {
        self.loop_count = self.loop_count.saturating_add(1);
        if self.sequence.is_infinite() || self.loop_count < self.sequence.loops() {
            return AdvanceResult {
                looped: true,
                completed: false,
            };
        }
        match self.policy {
            LoopPolicy::Restart => {
                self.loop_count = 0;
            }
            LoopPolicy::Freeze => {
                self.index = self.end_index();
                self.finished = true;
                self.state = PlaybackState::Paused;
            }
        }
        AdvanceResult {
            looped: true,
            completed: true,
        }
    }

    /// last frame shown by one full cycle
    fn end_index(&self) -> usize {
        match self.sequence.mode() {
            PlaybackMode::Forward => self.sequence.count().saturating_sub(1),
            PlaybackMode::Backward | PlaybackMode::PingPong => 0,
            PlaybackMode::Static => self.index,
        }
    }

    fn rewind(&mut self) {
        self.index = self.sequence.start_index();
        self.loop_count = 0;
        self.backwards = false;
        self.fps = self.sequence.fps();
        self.elapsed = 0.0;
        self.finished = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DT: f64 = 1.0 / 60.0;

    fn playing(frames: Vec<u32>, loops: u32, mode: PlaybackMode) -> AnimationInstance {
        let sequence = FrameSequence::new("test", frames, 10.0, loops, mode).unwrap();
        AnimationInstance::new(Rc::new(sequence), true)
    }

    #[test]
    fn forward_frame_follows_modulo() {
        for count in 1..6u32 {
            let frames: Vec<u32> = (0..count).map(|i| i * 3 + 1).collect();
            let mut anim = playing(frames.clone(), 0, PlaybackMode::Forward);
            for n in 0..25usize {
                assert_eq!(anim.current_frame(), frames[n % frames.len()]);
                anim.advance(DT);
            }
        }
    }

    #[test]
    fn backward_counts_down_and_wraps() {
        let count = 5usize;
        let mut anim = playing((0..count as u32).collect(), 0, PlaybackMode::Backward);
        assert_eq!(anim.index(), count - 1);
        for n in 1..=17usize {
            let result = anim.advance(DT);
            let expected = ((count as i64 - 1 - n as i64).rem_euclid(count as i64)) as usize;
            assert_eq!(anim.index(), expected);
            // the wrap 0 -> last is the loop boundary
            assert_eq!(result.looped, expected == count - 1);
        }
    }

    #[test]
    fn ping_pong_round_trip() {
        for k in 2..7usize {
            let mut anim = playing((0..k as u32).collect(), 0, PlaybackMode::PingPong);
            let start = anim.index();
            let mut boundaries = 0;
            for _ in 0..2 * (k - 1) {
                if anim.advance(DT).looped {
                    boundaries += 1;
                }
            }
            assert_eq!(anim.index(), start);
            assert_eq!(boundaries, 1, "k = {}", k);
        }
    }

    #[test]
    fn ping_pong_turns_at_the_end() {
        let mut anim = playing(vec![0, 1, 2, 3], 0, PlaybackMode::PingPong);
        let mut seen = Vec::new();
        for _ in 0..6 {
            anim.advance(DT);
            seen.push(anim.current_frame());
        }
        assert_eq!(seen, vec![1, 2, 3, 2, 1, 0]);
        assert_eq!(anim.loop_count(), 1);
    }

    #[test]
    fn static_never_moves() {
        let mut anim = playing(vec![4, 5, 6], 0, PlaybackMode::Static);
        for _ in 0..10 {
            assert!(!anim.advance(DT).looped);
            assert_eq!(anim.current_frame(), 4);
        }
    }

    #[test]
    fn empty_sequence_is_a_noop() {
        for mode in [
            PlaybackMode::Forward,
            PlaybackMode::Backward,
            PlaybackMode::Static,
            PlaybackMode::PingPong,
        ] {
            let mut anim = playing(vec![], 1, mode);
            for _ in 0..5 {
                assert_eq!(anim.advance(DT), AdvanceResult::default());
                assert_eq!(anim.current_frame(), 0);
                assert_eq!(anim.index(), 0);
            }
            assert_relative_eq!(anim.elapsed(), 0.0);
        }
    }

    #[test]
    fn finite_loops_restart_by_default() {
        let mut anim = playing(vec![5, 6, 7], 2, PlaybackMode::Forward);
        let results: Vec<AdvanceResult> = (0..6).map(|_| anim.advance(DT)).collect();
        assert!(results[2].looped && !results[2].completed);
        assert_eq!(anim.current_frame(), 5);
        assert!(results[5].looped && results[5].completed);
        assert_eq!(anim.loop_count(), 0);
        assert!(anim.is_playing());
    }

    #[test]
    fn freeze_holds_the_last_frame() {
        let mut anim =
            playing(vec![5, 6, 7], 1, PlaybackMode::Forward).with_policy(LoopPolicy::Freeze);
        anim.advance(DT);
        anim.advance(DT);
        let result = anim.advance(DT);
        assert!(result.completed);
        assert!(anim.is_finished());
        assert_eq!(anim.state(), PlaybackState::Paused);
        assert_eq!(anim.current_frame(), 7);
        // frozen, further ticks do nothing
        anim.advance(DT);
        assert_eq!(anim.current_frame(), 7);
        // playing again starts over
        anim.play();
        assert_eq!(anim.current_frame(), 5);
        assert!(!anim.is_finished());
    }

    #[test]
    fn freeze_backward_holds_first_frame() {
        let mut anim =
            playing(vec![1, 2], 1, PlaybackMode::Backward).with_policy(LoopPolicy::Freeze);
        anim.advance(DT);
        assert!(anim.advance(DT).completed);
        assert_eq!(anim.current_frame(), 1);
    }

    #[test]
    fn advance_only_while_playing() {
        let sequence =
            FrameSequence::new("idle", vec![1, 2, 3], 10.0, 0, PlaybackMode::Forward).unwrap();
        let mut anim = AnimationInstance::new(Rc::new(sequence), false);
        assert_eq!(anim.state(), PlaybackState::Stopped);
        anim.advance(DT);
        assert_eq!(anim.current_frame(), 1);

        anim.play();
        anim.advance(DT);
        assert_eq!(anim.current_frame(), 2);

        anim.pause();
        anim.pause();
        anim.advance(DT);
        assert_eq!(anim.current_frame(), 2);
        assert_eq!(anim.state(), PlaybackState::Paused);
    }

    #[test]
    fn stop_rewinds_everything() {
        let mut anim = playing(vec![1, 2, 3, 4], 0, PlaybackMode::Backward);
        anim.set_frame_rate(30.0);
        anim.advance(DT);
        anim.advance(DT);
        anim.stop();
        anim.stop();
        assert_eq!(anim.state(), PlaybackState::Stopped);
        assert_eq!(anim.index(), 3);
        assert_eq!(anim.loop_count(), 0);
        assert_relative_eq!(anim.fps(), 10.0);
        assert_relative_eq!(anim.elapsed(), 0.0);
    }

    #[test]
    fn frame_rate_override_leaves_template_alone() {
        let mut anim = playing(vec![1, 2], 0, PlaybackMode::Forward);
        anim.set_frame_rate(25.0);
        assert_relative_eq!(anim.fps(), 25.0);
        assert_relative_eq!(anim.frame_duration(), 0.04);
        assert_relative_eq!(anim.sequence().fps(), 10.0);
        anim.set_frame_rate(-1.0);
        assert_relative_eq!(anim.fps(), 25.0);
    }

    #[test]
    fn elapsed_sums_effective_ticks() {
        let mut anim = playing(vec![1, 2], 0, PlaybackMode::Forward);
        anim.advance(0.5);
        anim.advance(0.25);
        anim.pause();
        anim.advance(1.0);
        assert_relative_eq!(anim.elapsed(), 0.75);
    }

    #[test]
    fn single_frame_loops_every_tick() {
        let mut anim = playing(vec![9], 0, PlaybackMode::Forward);
        assert!(anim.advance(DT).looped);
        assert!(anim.advance(DT).looped);
        assert_eq!(anim.loop_count(), 2);
        assert_eq!(anim.current_frame(), 9);
    }
}
