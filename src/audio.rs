//! The audio contract this engine consumes. Device backends live outside the
//! crate; the session only needs transport control, a volume knob and a
//! best-effort position query. The engine's own clock stays authoritative,
//! so `position` feeding a display is fine and feeding judgment is not.

use log::warn;

use crate::error::AudioError;

pub trait AudioControl {
    fn play(&mut self) -> Result<(), AudioError>;
    fn pause(&mut self) -> Result<(), AudioError>;
    fn resume(&mut self) -> Result<(), AudioError>;
    fn stop(&mut self) -> Result<(), AudioError>;
    fn seek(&mut self, seconds: f64) -> Result<(), AudioError>;
    /// Volume in `0.0..=1.0`.
    fn set_volume(&mut self, volume: f64) -> Result<(), AudioError>;
    /// Best-effort playback position in seconds; `None` when the backend
    /// cannot say.
    fn position(&mut self) -> Option<f64>;
}

impl<A: AudioControl + ?Sized> AudioControl for Box<A> {
    fn play(&mut self) -> Result<(), AudioError> {
        (**self).play()
    }
    fn pause(&mut self) -> Result<(), AudioError> {
        (**self).pause()
    }
    fn resume(&mut self) -> Result<(), AudioError> {
        (**self).resume()
    }
    fn stop(&mut self) -> Result<(), AudioError> {
        (**self).stop()
    }
    fn seek(&mut self, seconds: f64) -> Result<(), AudioError> {
        (**self).seek(seconds)
    }
    fn set_volume(&mut self, volume: f64) -> Result<(), AudioError> {
        (**self).set_volume(volume)
    }
    fn position(&mut self) -> Option<f64> {
        (**self).position()
    }
}

/// Silence. Used when a chart resolves no audio asset or a host runs
/// headless.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioControl for NullAudio {
    fn play(&mut self) -> Result<(), AudioError> {
        Ok(())
    }
    fn pause(&mut self) -> Result<(), AudioError> {
        Ok(())
    }
    fn resume(&mut self) -> Result<(), AudioError> {
        Ok(())
    }
    fn stop(&mut self) -> Result<(), AudioError> {
        Ok(())
    }
    fn seek(&mut self, _seconds: f64) -> Result<(), AudioError> {
        Ok(())
    }
    fn set_volume(&mut self, _volume: f64) -> Result<(), AudioError> {
        Ok(())
    }
    fn position(&mut self) -> Option<f64> {
        None
    }
}

/// Wraps a backend so that its first failure is surfaced once and every call
/// after that becomes a no-op: play continues silently instead of crashing
/// mid-session.
#[derive(Debug)]
pub struct FallbackAudio<A> {
    inner: A,
    failed: bool,
}

impl<A: AudioControl> FallbackAudio<A> {
    pub fn new(inner: A) -> Self {
        Self { inner, failed: false }
    }

    pub fn is_degraded(&self) -> bool {
        self.failed
    }

    fn guard(&mut self, what: &str, result: Result<(), AudioError>) -> Result<(), AudioError> {
        if let Err(e) = result {
            warn!("audio {what} failed, continuing silently from here on: {e}");
            self.failed = true;
        }
        Ok(())
    }
}

impl<A: AudioControl> AudioControl for FallbackAudio<A> {
    fn play(&mut self) -> Result<(), AudioError> {
        if self.failed {
            return Ok(());
        }
        let r = self.inner.play();
        self.guard("play", r)
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        if self.failed {
            return Ok(());
        }
        let r = self.inner.pause();
        self.guard("pause", r)
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        if self.failed {
            return Ok(());
        }
        let r = self.inner.resume();
        self.guard("resume", r)
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        if self.failed {
            return Ok(());
        }
        let r = self.inner.stop();
        self.guard("stop", r)
    }

    fn seek(&mut self, seconds: f64) -> Result<(), AudioError> {
        if self.failed {
            return Ok(());
        }
        let r = self.inner.seek(seconds);
        self.guard("seek", r)
    }

    fn set_volume(&mut self, volume: f64) -> Result<(), AudioError> {
        if self.failed {
            return Ok(());
        }
        let r = self.inner.set_volume(volume.clamp(0.0, 1.0));
        self.guard("set_volume", r)
    }

    fn position(&mut self) -> Option<f64> {
        if self.failed {
            return None;
        }
        self.inner.position()
    }
}

#[cfg(test)]
mod tests {
    use super::{AudioControl, FallbackAudio, NullAudio};
    use crate::error::AudioError;

    /// Fails every call, counting how many reach it.
    struct BrokenAudio {
        calls: u32,
    }

    impl AudioControl for BrokenAudio {
        fn play(&mut self) -> Result<(), AudioError> {
            self.calls += 1;
            Err(AudioError("device gone".to_string()))
        }
        fn pause(&mut self) -> Result<(), AudioError> {
            self.calls += 1;
            Err(AudioError("device gone".to_string()))
        }
        fn resume(&mut self) -> Result<(), AudioError> {
            self.calls += 1;
            Err(AudioError("device gone".to_string()))
        }
        fn stop(&mut self) -> Result<(), AudioError> {
            self.calls += 1;
            Err(AudioError("device gone".to_string()))
        }
        fn seek(&mut self, _seconds: f64) -> Result<(), AudioError> {
            self.calls += 1;
            Err(AudioError("device gone".to_string()))
        }
        fn set_volume(&mut self, _volume: f64) -> Result<(), AudioError> {
            self.calls += 1;
            Err(AudioError("device gone".to_string()))
        }
        fn position(&mut self) -> Option<f64> {
            None
        }
    }

    #[test]
    fn null_audio_accepts_everything() {
        let mut a = NullAudio;
        assert!(a.play().is_ok());
        assert!(a.seek(12.0).is_ok());
        assert!(a.position().is_none());
    }

    #[test]
    fn fallback_degrades_after_first_failure() {
        let mut a = FallbackAudio::new(BrokenAudio { calls: 0 });
        assert!(a.play().is_ok());
        assert!(a.is_degraded());
        // Later calls never reach the broken backend again.
        assert!(a.pause().is_ok());
        assert!(a.seek(3.0).is_ok());
        assert_eq!(a.inner.calls, 1);
        assert!(a.position().is_none());
    }
}
