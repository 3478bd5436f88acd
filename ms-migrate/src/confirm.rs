use std::io::{self, BufRead, BufReader, Stdin, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use switchport_core::{ConfirmAnswer, Confirmer};
use tokio_util::sync::CancellationToken;

/// How often a pending prompt checks for cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Asks the operator on stderr and reads answer lines from `input`.
///
/// One reader thread, started at the first prompt, owns `input` for the
/// confirmer's lifetime, so a prompt can give up after `timeout` or when
/// `cancel` fires without stranding a read. A line that arrives after a
/// prompt gave up is discarded rather than answering the next prompt.
pub struct LineConfirmer<R> {
    input: Option<R>,
    lines: Option<Receiver<io::Result<String>>>,
    stale: bool,
    timeout: Option<Duration>,
    cancel: CancellationToken,
}

pub type StdinConfirmer = LineConfirmer<BufReader<Stdin>>;

impl StdinConfirmer {
    pub fn stdin(timeout: Option<Duration>, cancel: CancellationToken) -> Self {
        LineConfirmer::new(BufReader::new(io::stdin()), timeout, cancel)
    }
}

impl<R: BufRead + Send + 'static> LineConfirmer<R> {
    pub fn new(input: R, timeout: Option<Duration>, cancel: CancellationToken) -> Self {
        Self {
            input: Some(input),
            lines: None,
            stale: false,
            timeout,
            cancel,
        }
    }

    fn lines(&mut self) -> Option<&Receiver<io::Result<String>>> {
        if self.lines.is_none() {
            let input = self.input.take()?;
            let (tx, rx) = mpsc::channel();
            thread::spawn(move || forward_lines(input, tx));
            self.lines = Some(rx);
        }
        self.lines.as_ref()
    }

    fn give_up(&mut self, answer: ConfirmAnswer) -> ConfirmAnswer {
        self.stale = true;
        let _ = writeln!(io::stderr());
        answer
    }
}

impl<R: BufRead + Send + 'static> Confirmer for LineConfirmer<R> {
    fn confirm(&mut self, prompt: &str) -> ConfirmAnswer {
        let timeout = self.timeout;
        let cancel = self.cancel.clone();
        let stale = std::mem::take(&mut self.stale);
        let Some(lines) = self.lines() else {
            return ConfirmAnswer::No;
        };
        if stale {
            while let Ok(Ok(_)) = lines.try_recv() {}
        }

        let mut stderr = io::stderr();
        let _ = write!(stderr, "{prompt} [y/N]: ");
        let _ = stderr.flush();

        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let answer = loop {
            if cancel.is_cancelled() {
                break Err(ConfirmAnswer::No);
            }
            let wait = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break Err(ConfirmAnswer::TimedOut);
                    }
                    (deadline - now).min(POLL_INTERVAL)
                }
                None => POLL_INTERVAL,
            };
            match lines.recv_timeout(wait) {
                Ok(Ok(line)) => break Ok(parse_answer(&line)),
                Ok(Err(_)) | Err(RecvTimeoutError::Disconnected) => break Ok(ConfirmAnswer::No),
                Err(RecvTimeoutError::Timeout) => {}
            }
        };
        answer.unwrap_or_else(|gave_up| self.give_up(gave_up))
    }
}

/// Forward lines until end of input, a read error, or the confirmer is
/// dropped.
fn forward_lines<R: BufRead>(mut input: R, tx: Sender<io::Result<String>>) {
    loop {
        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) => return,
            Ok(_) => {
                if tx.send(Ok(line)).is_err() {
                    return;
                }
            }
            Err(err) => {
                let _ = tx.send(Err(err));
                return;
            }
        }
    }
}

/// `y` or `yes` in any case is affirmative; anything else refuses.
pub fn parse_answer(line: &str) -> ConfirmAnswer {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => ConfirmAnswer::Yes,
        _ => ConfirmAnswer::No,
    }
}
