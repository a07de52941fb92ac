//! PDM microphone capture and the audio frame store.
//!
//! The capture side runs asynchronously to the control loop (a dedicated
//! reader task on the device target) and publishes whole frames into a
//! double-buffered sample store:
//!
//! ```text
//! ┌──────────────┐  publish_frame   ┌─────────────┐  take_frame  ┌───────────┐
//! │ PDM capture  │ ───────────────▶ │  bank 0 / 1 │ ───────────▶ │ main loop │
//! │ (producer)   │   atomic bank+len│  (16-bit)   │  swap len→0  │ (consumer)│
//! └──────────────┘                  └─────────────┘              └───────────┘
//! ```
//!
//! The producer always writes the bank that is *not* published, then
//! release-stores the bank index and length; the consumer acquire-swaps
//! the length to zero and copies out of the published bank.  A delivery
//! racing a consume therefore lands in the other bank and can never tear
//! the frame being scanned.  A frame published before the previous one is
//! consumed replaces it — frames are overwritten, never queued.

use core::sync::atomic::{AtomicUsize, Ordering};

#[cfg(target_os = "espidf")]
use log::info;

use crate::error::SensorError;

/// Capacity of one sample bank.  Rev1 publishes 256-sample frames, Rev2
/// the full 1024.
pub const FRAME_CAP: usize = 1024;

/// Index of the bank holding the most recently published frame.
static PUBLISHED_BANK: AtomicUsize = AtomicUsize::new(0);
/// Length of the published frame; zero means consumed (or never filled).
/// This is the single synchronisation point between producer and consumer.
static PUBLISHED_LEN: AtomicUsize = AtomicUsize::new(0);

// SAFETY: SAMPLE_BANKS is accessed exclusively through publish_frame()
// (producer: capture task / test code — one writer) and take_frame()
// (consumer: main loop — one reader).  The producer only touches the
// unpublished bank and flips PUBLISHED_BANK afterwards, so the two sides
// never address the same bank while PUBLISHED_LEN is non-zero.
static mut SAMPLE_BANKS: [[i16; FRAME_CAP]; 2] = [[0; FRAME_CAP]; 2];

/// Publish one frame from the capture side.  Frames longer than
/// [`FRAME_CAP`] are truncated.
pub fn publish_frame(samples: &[i16]) {
    let len = samples.len().min(FRAME_CAP);
    let bank = 1 - PUBLISHED_BANK.load(Ordering::Relaxed);

    // SAFETY: single producer, and `bank` is the unpublished half; the
    // consumer cannot be reading it (see SAMPLE_BANKS invariant above).
    let dst = unsafe { &mut (*(&raw mut SAMPLE_BANKS))[bank] };
    dst[..len].copy_from_slice(&samples[..len]);

    PUBLISHED_BANK.store(bank, Ordering::Relaxed);
    PUBLISHED_LEN.store(len, Ordering::Release);
}

/// Consume the published frame, if any, copying it into `out`.
///
/// Returns the frame length, or `None` when nothing was published since
/// the last call.  Consuming resets the published length to zero.
pub fn take_frame(out: &mut [i16; FRAME_CAP]) -> Option<usize> {
    let len = PUBLISHED_LEN.swap(0, Ordering::AcqRel);
    if len == 0 {
        return None;
    }
    let bank = PUBLISHED_BANK.load(Ordering::Acquire);

    // SAFETY: the producer writes only the unpublished bank; having
    // observed len > 0 via the acquire swap, this bank's contents are
    // fully written and stable until the next publication flips banks.
    let src = unsafe { &(*(&raw const SAMPLE_BANKS))[bank] };
    out[..len].copy_from_slice(&src[..len]);
    Some(len)
}

// ---------------------------------------------------------------------------
// Capture task (device target)
// ---------------------------------------------------------------------------

/// Start PDM capture: bring up the I2S PDM RX channel and spawn the
/// reader task that publishes frames of `frame_len` samples.
#[cfg(target_os = "espidf")]
pub fn start_capture(frame_len: usize) -> Result<(), SensorError> {
    use crate::drivers::hw_init;

    let frame_len = frame_len.min(FRAME_CAP);
    hw_init::init_pdm_rx().map_err(|_| SensorError::AudioCaptureFailed)?;

    std::thread::Builder::new()
        .name("pdm-capture".into())
        .stack_size(4096)
        .spawn(move || {
            let mut frame = [0i16; FRAME_CAP];
            loop {
                // Blocks until a full frame of decimated samples arrives.
                let read = hw_init::pdm_read(&mut frame[..frame_len]);
                if read > 0 {
                    publish_frame(&frame[..read]);
                }
            }
        })
        .map_err(|_| SensorError::AudioCaptureFailed)?;

    info!("microphone: PDM capture running ({frame_len}-sample frames)");
    Ok(())
}

/// Host build: capture hardware is absent; tests publish frames directly
/// via [`publish_frame`].
#[cfg(not(target_os = "espidf"))]
pub fn start_capture(_frame_len: usize) -> Result<(), SensorError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // One sequential test: the frame store is process-global, so phases
    // share a single #[test] rather than racing across the test harness
    // threads.
    #[test]
    fn publish_take_sequence() {
        let mut out = [0i16; FRAME_CAP];

        // Nothing published yet.
        assert_eq!(take_frame(&mut out), None);

        // Round trip.
        publish_frame(&[1, -2, 3]);
        assert_eq!(take_frame(&mut out), Some(3));
        assert_eq!(&out[..3], &[1, -2, 3]);

        // Consumed: a second take sees nothing.
        assert_eq!(take_frame(&mut out), None);

        // Unconsumed frames are replaced, not queued.
        publish_frame(&[10; 8]);
        publish_frame(&[20; 4]);
        assert_eq!(take_frame(&mut out), Some(4));
        assert_eq!(&out[..4], &[20; 4]);
        assert_eq!(take_frame(&mut out), None);

        // Oversized deliveries truncate to the bank capacity.
        let big = [7i16; FRAME_CAP + 32];
        publish_frame(&big);
        assert_eq!(take_frame(&mut out), Some(FRAME_CAP));
        assert!(out.iter().all(|&s| s == 7));
    }
}
