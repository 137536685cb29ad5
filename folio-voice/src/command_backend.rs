//! Speech backends that shell out to external programs.
//!
//! Recognition runs a long-lived command whose stdout carries one event per
//! line (`partial: <text>`, `final: <text>`, `error: <text>`); the session
//! ends when stdout closes. Synthesis runs a command with the utterance as
//! its last argument and treats process exit as the end of speech.

use anyhow::{Context, Result, anyhow};
use std::env;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::traits::{SpeechRecognizer, SpeechSynthesizer};
use crate::types::{RecognitionEvent, SynthesisEvent};

/// Parse one line of recognizer output
pub fn parse_line(line: &str) -> Option<RecognitionEvent> {
    let (tag, text) = line.split_once(':')?;
    let text = text.trim().to_string();
    match tag.trim() {
        "partial" => Some(RecognitionEvent::Interim(text)),
        "final" => Some(RecognitionEvent::Final(text)),
        "error" => Some(RecognitionEvent::Error(text)),
        _ => None,
    }
}

/// Resolve a program name the way a shell would: paths are checked as-is,
/// bare names are searched on PATH.
fn find_program(program: &str) -> Option<PathBuf> {
    let path = Path::new(program);
    if path.components().count() > 1 {
        return path.is_file().then(|| path.to_path_buf());
    }
    env::var_os("PATH").and_then(|paths| {
        env::split_paths(&paths)
            .map(|dir| dir.join(program))
            .find(|candidate| candidate.is_file())
    })
}

fn split_command(command: Vec<String>) -> Result<(PathBuf, Vec<String>)> {
    let mut parts = command.into_iter();
    let program = parts
        .next()
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| anyhow!("empty command"))?;
    let resolved =
        find_program(&program).ok_or_else(|| anyhow!("{program} was not found on PATH"))?;
    Ok((resolved, parts.collect()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopMode {
    Finish,
    Abort,
}

pub struct CommandRecognizer {
    program: PathBuf,
    args: Vec<String>,
    stop_tx: Option<oneshot::Sender<StopMode>>,
}

impl CommandRecognizer {
    pub fn new(command: Vec<String>) -> Result<Self> {
        let (program, args) = split_command(command).context("speech recognizer")?;
        Ok(Self {
            program,
            args,
            stop_tx: None,
        })
    }

    fn signal(&mut self, mode: StopMode) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(mode);
        }
    }
}

impl SpeechRecognizer for CommandRecognizer {
    fn start(&mut self) -> Result<UnboundedReceiver<RecognitionEvent>> {
        self.signal(StopMode::Abort);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to run {}", self.program.display()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("recognizer stdout unavailable"))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel();
        self.stop_tx = Some(stop_tx);
        tokio::spawn(read_recognizer(child, BufReader::new(stdout), tx, stop_rx));
        Ok(rx)
    }

    fn stop(&mut self) {
        self.signal(StopMode::Finish);
    }

    fn abort(&mut self) {
        self.signal(StopMode::Abort);
    }
}

async fn read_recognizer(
    mut child: Child,
    stdout: BufReader<tokio::process::ChildStdout>,
    tx: UnboundedSender<RecognitionEvent>,
    mut stop_rx: oneshot::Receiver<StopMode>,
) {
    let mut lines = stdout.lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if let Some(event) = parse_line(&line) {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                }
                Ok(None) => {
                    let _ = tx.send(RecognitionEvent::End);
                    break;
                }
                Err(e) => {
                    let _ = tx.send(RecognitionEvent::Error(e.to_string()));
                    let _ = tx.send(RecognitionEvent::End);
                    break;
                }
            },
            mode = &mut stop_rx => {
                // a dropped sender means the recognizer itself is gone
                let mode = mode.unwrap_or(StopMode::Abort);
                debug!(?mode, "Stopping recognizer command");
                if mode == StopMode::Finish {
                    let _ = tx.send(RecognitionEvent::End);
                }
                break;
            }
        }
    }
    if let Err(e) = child.kill().await {
        debug!("Recognizer command already exited: {}", e);
    }
}

pub struct CommandSynthesizer {
    program: PathBuf,
    args: Vec<String>,
    cancel_tx: Option<oneshot::Sender<()>>,
}

impl CommandSynthesizer {
    pub fn new(command: Vec<String>) -> Result<Self> {
        let (program, args) = split_command(command).context("speech synthesizer")?;
        Ok(Self {
            program,
            args,
            cancel_tx: None,
        })
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn speak(&mut self, text: &str) -> Result<UnboundedReceiver<SynthesisEvent>> {
        self.cancel();

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to run {}", self.program.display()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = oneshot::channel();
        self.cancel_tx = Some(cancel_tx);
        let _ = tx.send(SynthesisEvent::Started);
        tokio::spawn(wait_for_speech(child, tx, cancel_rx));
        Ok(rx)
    }

    fn cancel(&mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn wait_for_speech(
    mut child: Child,
    tx: UnboundedSender<SynthesisEvent>,
    cancel_rx: oneshot::Receiver<()>,
) {
    tokio::select! {
        status = child.wait() => {
            let event = match status {
                Ok(status) if status.success() => SynthesisEvent::Ended,
                Ok(status) => SynthesisEvent::Error(format!("speech command exited with {status}")),
                Err(e) => SynthesisEvent::Error(e.to_string()),
            };
            let _ = tx.send(event);
        }
        _ = cancel_rx => {
            if let Err(e) = child.kill().await {
                warn!("Failed to stop speech command: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("partial: hello wor"), Some(RecognitionEvent::Interim("hello wor".into())));
        assert_eq!(parse_line("final:hello world "), Some(RecognitionEvent::Final("hello world".into())));
        assert_eq!(parse_line("error: no-speech"), Some(RecognitionEvent::Error("no-speech".into())));
        assert_eq!(parse_line("final: time is 10:30"), Some(RecognitionEvent::Final("time is 10:30".into())));
        assert_eq!(parse_line("loading model..."), None);
        assert_eq!(parse_line("debug: x"), None);
    }

    #[test]
    fn test_missing_program_is_rejected() {
        assert!(CommandSynthesizer::new(vec!["definitely-not-a-real-tts-binary".into()]).is_err());
        assert!(CommandRecognizer::new(Vec::new()).is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_recognizer_reads_events_until_exit() {
        let mut recognizer = CommandRecognizer::new(vec![
            "sh".into(),
            "-c".into(),
            "echo 'partial: hel'; echo 'final: hello'".into(),
        ])
        .unwrap();
        let mut rx = recognizer.start().unwrap();

        assert_eq!(rx.recv().await, Some(RecognitionEvent::Interim("hel".into())));
        assert_eq!(rx.recv().await, Some(RecognitionEvent::Final("hello".into())));
        assert_eq!(rx.recv().await, Some(RecognitionEvent::End));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_synthesizer_reports_exit_and_cancel() {
        let mut synthesizer = CommandSynthesizer::new(vec!["true".into()]).unwrap();
        let mut rx = synthesizer.speak("hello").unwrap();
        assert_eq!(rx.recv().await, Some(SynthesisEvent::Started));
        assert_eq!(rx.recv().await, Some(SynthesisEvent::Ended));

        let mut slow = CommandSynthesizer::new(vec!["sleep".into()]).unwrap();
        let mut rx = slow.speak("30").unwrap();
        assert_eq!(rx.recv().await, Some(SynthesisEvent::Started));
        slow.cancel();
        assert_eq!(rx.recv().await, None);
    }
}
