//! Main service loop.
//!
//! One task owns the `ReaderApp`. Commands arrive from the input monitor,
//! fetch and synthesis jobs run on spawned tasks and report back over a
//! channel, and a periodic tick detects the natural end of playback.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::app::{Effect, ReaderApp};
use crate::content::FetchOutcome;
use crate::input::{Command, InputMonitor, HELP};
use crate::speech::SynthesisOutcome;
use crate::view;

/// Results of jobs running off the service task.
#[derive(Debug)]
enum JobEvent {
    Fetched(FetchOutcome),
    Synthesized(SynthesisOutcome),
}

pub struct ReaderService {
    app: ReaderApp,
}

impl ReaderService {
    pub fn new(app: ReaderApp) -> Self {
        Self { app }
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let (command_tx, mut command_rx) = mpsc::channel::<Command>(16);
        let (job_tx, mut job_rx) = mpsc::channel::<JobEvent>(16);

        // Start input monitor in background
        let monitor = InputMonitor::new(command_tx);
        tokio::spawn(async move {
            monitor.run().await;
        });

        let initial = self.app.start();
        spawn(&job_tx, initial);
        self.redraw();
        println!("輸入 help 查看指令");

        // Natural-end poll interval
        let mut end_poll = tokio::time::interval(tokio::time::Duration::from_millis(100));

        loop {
            tokio::select! {
                command = command_rx.recv() => {
                    match command {
                        Some(Command::Quit) | None => {
                            info!("Shutting down");
                            break;
                        }
                        Some(Command::Help) => println!("{HELP}"),
                        Some(command) => {
                            if let Some(effect) = self.app.handle(command) {
                                spawn(&job_tx, effect);
                            }
                            self.redraw();
                        }
                    }
                }
                event = job_rx.recv() => {
                    match event {
                        Some(JobEvent::Fetched(outcome)) => {
                            if self.app.on_fetched(outcome) {
                                self.redraw();
                            }
                        }
                        Some(JobEvent::Synthesized(outcome)) => {
                            self.app.on_synthesized(outcome);
                            self.redraw();
                        }
                        None => {
                            warn!("Job channel closed");
                            break;
                        }
                    }
                }
                _ = end_poll.tick() => {
                    if self.app.poll_playback() {
                        self.redraw();
                    }
                }
            }
        }

        // Leave nothing playing on exit
        let _ = self.app.handle(Command::Stop);
        Ok(())
    }

    fn redraw(&self) {
        println!("\n{}", view::render(&self.app));
    }
}

fn spawn(job_tx: &mpsc::Sender<JobEvent>, effect: Effect) {
    let tx = job_tx.clone();
    match effect {
        Effect::Fetch(job) => {
            debug!("Spawning fetch {}", job.token());
            tokio::spawn(async move {
                let _ = tx.send(JobEvent::Fetched(job.run().await)).await;
            });
        }
        Effect::Synthesize(job) => {
            debug!("Spawning synthesis {}", job.token());
            tokio::spawn(async move {
                let _ = tx.send(JobEvent::Synthesized(job.run().await)).await;
            });
        }
    }
}
