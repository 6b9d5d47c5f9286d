//! Audio collaborator
//!
//! The simulation only names sounds. `AudioManager` applies volume/mute
//! settings and queues play requests for whatever backend the host has.

use crate::platform::AudioSink;
use crate::settings::Settings;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// Player volley fired
    Shoot,
    /// Bullet or projectile impact
    Hit,
    /// Enemy or boss destroyed
    Explosion,
    GateAdd,
    GateSubtract,
    GateMultiply,
    GameOver,
    Victory,
    ButtonClick,
    BossAppear,
    BossAttack,
}

impl SoundCue {
    /// Per-cue mix level. Frequent sounds sit lower in the mix.
    pub fn base_gain(&self) -> f32 {
        match self {
            SoundCue::Shoot => 0.2,
            SoundCue::Hit => 0.25,
            SoundCue::GateSubtract => 0.5,
            SoundCue::ButtonClick => 0.4,
            _ => 1.0,
        }
    }

    /// Stingers that pause background music
    pub fn is_stinger(&self) -> bool {
        matches!(self, SoundCue::GameOver | SoundCue::Victory)
    }
}

/// A queued request for the playback backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayRequest {
    pub cue: SoundCue,
    pub gain: f32,
}

/// Audio manager for the game
#[derive(Debug, Clone)]
pub struct AudioManager {
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    muted: bool,
    music_paused: bool,
    pending: Vec<PlayRequest>,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            muted: false,
            music_paused: false,
            pending: Vec::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let mut audio = Self::new();
        audio.set_master_volume(settings.master_volume);
        audio.set_sfx_volume(settings.sfx_volume);
        audio.set_music_volume(settings.music_volume);
        audio
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
    }

    /// Set sound effects volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, volume: f32) {
        self.sfx_volume = volume.clamp(0.0, 1.0);
    }

    /// Set music volume (0.0 - 1.0)
    pub fn set_music_volume(&mut self, volume: f32) {
        self.music_volume = volume.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn music_paused(&self) -> bool {
        self.music_paused
    }

    /// Background music gain after pause/mute
    pub fn music_gain(&self) -> f32 {
        if self.muted || self.music_paused {
            0.0
        } else {
            self.master_volume * self.music_volume
        }
    }

    /// Final gain for a cue
    pub fn effective_gain(&self, cue: SoundCue) -> f32 {
        if self.muted {
            return 0.0;
        }
        self.master_volume * self.sfx_volume * cue.base_gain()
    }

    /// Resume music after a stinger (new stage, restart)
    pub fn resume_music(&mut self) {
        self.music_paused = false;
    }

    /// Queue a cue. Silent cues are dropped.
    pub fn play(&mut self, cue: SoundCue) {
        if cue.is_stinger() {
            self.music_paused = true;
        }
        let gain = self.effective_gain(cue);
        if gain <= 0.0 {
            return;
        }
        log::debug!("Play {:?} at gain {:.2}", cue, gain);
        self.pending.push(PlayRequest { cue, gain });
    }

    /// Requests accumulated since the last drain
    pub fn drain(&mut self) -> Vec<PlayRequest> {
        std::mem::take(&mut self.pending)
    }
}

impl AudioSink for AudioManager {
    fn play_sound(&mut self, cue: SoundCue) {
        self.play(cue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_and_mute() {
        let mut audio = AudioManager::new();
        audio.set_master_volume(0.5);
        audio.set_sfx_volume(1.0);
        assert!((audio.effective_gain(SoundCue::Explosion) - 0.5).abs() < 1e-6);
        assert!((audio.effective_gain(SoundCue::Shoot) - 0.1).abs() < 1e-6);

        audio.set_muted(true);
        audio.play(SoundCue::Explosion);
        assert!(audio.drain().is_empty());
    }

    #[test]
    fn test_stinger_pauses_music() {
        let mut audio = AudioManager::new();
        assert!(audio.music_gain() > 0.0);
        audio.play(SoundCue::Victory);
        assert!(audio.music_paused());
        assert_eq!(audio.music_gain(), 0.0);
        assert_eq!(audio.drain().len(), 1);
        audio.resume_music();
        assert!(audio.music_gain() > 0.0);
    }

    #[test]
    fn test_volume_clamped() {
        let mut audio = AudioManager::new();
        audio.set_master_volume(3.0);
        audio.set_sfx_volume(-1.0);
        assert_eq!(audio.effective_gain(SoundCue::Hit), 0.0);
    }
}
