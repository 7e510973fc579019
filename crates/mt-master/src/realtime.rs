//! Realtime playback through an audio output.

use std::sync::atomic::{AtomicBool, Ordering};

use mt_audio::{AudioOutput, CpalOutput};
use mt_engine::Frame;

use crate::{Controller, ControllerError, TickReport};

/// Open the default output device and start its stream.
pub fn open_default_output() -> Result<CpalOutput, ControllerError> {
    let (mut output, consumer) = CpalOutput::new()?;
    output.build_stream(consumer)?;
    Ok(output)
}

/// Play the timeline from the playhead through `output` until it ends or
/// `stop` is raised. `on_tick` sees every tick's report.
///
/// The output's sample rate should match the controller's.
pub fn run_realtime(
    controller: &mut Controller,
    output: &mut impl AudioOutput,
    stop: &AtomicBool,
    mut on_tick: impl FnMut(&TickReport),
) -> Result<(), ControllerError> {
    let sample_rate = controller.config().sample_rate;
    if output.sample_rate() != sample_rate {
        log::warn!(
            "output runs at {} Hz but the engine renders at {} Hz",
            output.sample_rate(),
            sample_rate
        );
    }

    output.start()?;
    controller.play();

    let mut buf = Vec::with_capacity(controller.config().frames_per_tick());
    while controller.is_playing() && !stop.load(Ordering::Relaxed) {
        let report = controller.render_tick(&mut buf);
        output.write(&buf)?;
        on_tick(&report);
        if report.finished {
            break;
        }
    }
    if controller.is_playing() {
        controller.pause();
    }

    // Flush the device queue with a short tail of silence.
    let tail = vec![Frame::silence(); sample_rate as usize / 10];
    output.write(&tail)?;
    output.stop()?;
    Ok(())
}
