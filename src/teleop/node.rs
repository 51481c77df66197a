//! # Teleop Node Module
//!
//! Wires the [`JoystickFrameMapper`] and [`VelocityRamper`] together and
//! drives them from a [`FrameSource`] to a [`CommandSink`].
//!
//! Frames are handled strictly one at a time, so the ramp state has a single
//! writer. A malformed or unparseable frame is logged and skipped; the ramp
//! state is left exactly as it was before that frame.

use std::future::Future;

use tracing::{debug, info, warn};

use super::mapper::{JoystickFrameMapper, RawFrame};
use super::ramper::{VelocityCommand, VelocityRamper};
use crate::error::Result;
use crate::sink::CommandSink;
use crate::source::FrameSource;

/// Counters reported when the loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Commands handed to the sink.
    pub published: u64,
    /// Frames dropped as malformed or unparseable.
    pub skipped: u64,
}

/// Joystick teleoperation pipeline.
#[derive(Debug, Clone, Default)]
pub struct TeleopNode {
    mapper: JoystickFrameMapper,
    ramper: VelocityRamper,
    stats: RunStats,
}

impl TeleopNode {
    #[must_use]
    pub fn new(mapper: JoystickFrameMapper, ramper: VelocityRamper) -> Self {
        Self {
            mapper,
            ramper,
            stats: RunStats::default(),
        }
    }

    #[must_use]
    pub fn ramper(&self) -> &VelocityRamper {
        &self.ramper
    }

    #[must_use]
    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Maps and ramps one frame.
    ///
    /// # Errors
    ///
    /// Returns `MalformedFrame` if the frame is too short. The ramp state is
    /// not touched in that case.
    pub fn handle_frame(&mut self, frame: &RawFrame) -> Result<VelocityCommand> {
        let js = self.mapper.map_frame(frame)?;
        let cmd = self.ramper.step(&js);

        let coasting = !js.any_axis_moved() && !cmd.is_stop();
        debug!(
            "Linear {:.3} Angular {:.3} Max speed {:.3}{}",
            cmd.linear,
            cmd.angular,
            self.ramper.max_speed(),
            if coasting { " (coasting)" } else { "" }
        );

        Ok(cmd)
    }

    /// Runs until the source is exhausted or `shutdown` completes.
    ///
    /// Shutdown is checked before each frame, so a busy source cannot delay it.
    ///
    /// # Errors
    ///
    /// Returns the first non-recoverable source or sink error.
    pub async fn run<S, K, F>(&mut self, source: &mut S, sink: &mut K, shutdown: F) -> Result<RunStats>
    where
        S: FrameSource + ?Sized,
        K: CommandSink + ?Sized,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let next = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                next = source.next_frame() => next,
            };

            let frame = match next {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!("Input closed");
                    break;
                }
                Err(e) if e.is_recoverable() => {
                    warn!("Skipping input: {}", e);
                    self.stats.skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            match self.handle_frame(&frame) {
                Ok(cmd) => {
                    sink.publish(&cmd).await?;
                    self.stats.published += 1;
                }
                Err(e) if e.is_recoverable() => {
                    warn!("Skipping frame: {}", e);
                    self.stats.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Published {} commands, skipped {} frames",
            self.stats.published, self.stats.skipped
        );
        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TeleopError;
    use crate::sink::mocks::MockCommandSink;
    use crate::source::mocks::MockFrameSource;

    fn forward() -> RawFrame {
        RawFrame::new(vec![0.0, 1.0], vec![false; 4])
    }

    #[test]
    fn test_handle_frame_ramps() {
        let mut node = TeleopNode::default();
        node.handle_frame(&forward()).unwrap();
        let cmd = node.handle_frame(&forward()).unwrap();
        assert!((cmd.linear - 0.02).abs() < 1e-9);
    }

    #[test]
    fn test_malformed_frame_leaves_state_untouched() {
        let mut node = TeleopNode::default();
        for _ in 0..3 {
            node.handle_frame(&forward()).unwrap();
        }
        let before = *node.ramper().state();

        let short = RawFrame::new(vec![1.0], vec![false; 4]);
        let err = node.handle_frame(&short).unwrap_err();

        assert!(matches!(err, TeleopError::MalformedFrame { axes: 1, .. }));
        assert_eq!(*node.ramper().state(), before);
    }

    #[tokio::test]
    async fn test_run_publishes_one_command_per_frame() {
        let mut source = MockFrameSource::new(vec![Ok(forward()), Ok(forward()), Ok(forward())]);
        let sink = MockCommandSink::new();
        let mut handle = sink.clone();
        let mut node = TeleopNode::default();

        let stats = node
            .run(&mut source, &mut handle, std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats, RunStats { published: 3, skipped: 0 });
        let published = sink.get_published();
        assert_eq!(published.len(), 3);
        assert!((published[2].linear - 0.04).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_run_skips_bad_frames() {
        let bad_json = serde_json::from_str::<RawFrame>("not json").unwrap_err();
        let mut source = MockFrameSource::new(vec![
            Ok(forward()),
            Ok(RawFrame::new(vec![1.0, 1.0], vec![false])),
            Err(bad_json.into()),
            Ok(forward()),
        ]);
        let mut sink = MockCommandSink::new();
        let mut node = TeleopNode::default();

        let stats = node
            .run(&mut source, &mut sink, std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats, RunStats { published: 2, skipped: 2 });
        // Skipped frames did not advance the ramp
        let published = sink.get_published();
        assert!((published[1].linear - 0.02).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_run_stops_on_fatal_source_error() {
        let mut source = MockFrameSource::new(vec![
            Ok(forward()),
            Err(TeleopError::Controller("device unplugged".to_string())),
            Ok(forward()),
        ]);
        let mut sink = MockCommandSink::new();
        let mut node = TeleopNode::default();

        let result = node.run(&mut source, &mut sink, std::future::pending()).await;

        assert!(matches!(result, Err(TeleopError::Controller(_))));
        assert_eq!(node.stats().published, 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_sink_error() {
        let mut source = MockFrameSource::new(vec![Ok(forward()), Ok(forward())]);
        let mut sink = MockCommandSink::new();
        sink.set_publish_error(std::io::ErrorKind::BrokenPipe);
        let mut node = TeleopNode::default();

        let result = node.run(&mut source, &mut sink, std::future::pending()).await;

        assert!(matches!(result, Err(TeleopError::Io(_))));
        assert_eq!(node.stats().published, 0);
    }

    #[tokio::test]
    async fn test_run_honors_shutdown() {
        let mut source = MockFrameSource::endless(forward());
        let mut sink = MockCommandSink::new();
        let mut node = TeleopNode::default();

        let stats = node
            .run(&mut source, &mut sink, std::future::ready(()))
            .await
            .unwrap();

        assert_eq!(stats, RunStats::default());
        assert!(sink.get_published().is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_at_shutdown_mid_stream() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let mut source = MockFrameSource::endless(forward());
        let sink = MockCommandSink::new();
        let mut handle = sink.clone();
        let mut node = TeleopNode::default();

        let watcher = sink.clone();
        let stop = async move {
            while watcher.get_published().len() < 3 {
                tokio::task::yield_now().await;
            }
            let _ = tx.send(());
        };
        let shutdown = async move {
            let _ = rx.await;
        };

        let (stats, ()) = tokio::join!(node.run(&mut source, &mut handle, shutdown), stop);
        let stats = stats.unwrap();

        // Endless input, so only shutdown can have ended the loop
        assert!(stats.published >= 3);
        assert_eq!(stats.published as usize, sink.get_published().len());
    }
}
