//! Line source: splits the input stream into lines and feeds them, lightly shuffled, to the parse stage.

use crossbeam_channel::Sender;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::io::{self, BufRead, BufReader, Read};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::utils::config::PipelineConsts;

use super::context::{PipelineState, send_unless_stopped};

/// Read one line into `buf`, without its `\n` / `\r\n` terminator. Lines may be of any length.
/// Returns false at end of stream.
fn read_line<B: BufRead>(r: &mut B, raw: &mut Vec<u8>, buf: &mut String) -> io::Result<bool> {
    raw.clear();
    buf.clear();
    if r.read_until(b'\n', raw)? == 0 {
        return Ok(false);
    }
    if raw.last() == Some(&b'\n') {
        raw.pop();
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
    }
    buf.push_str(&String::from_utf8_lossy(raw));
    Ok(true)
}

/// Read every line of `reader` and send it on `line_tx`, through a randomization window of
/// `window_capacity` slots.
///
/// The window is filled first; after that each new line evicts a random slot, which is sent.
/// Remaining slots are drained at end of stream. This breaks up runs of statements on the same
/// subject (sorted input) so mutation workers don't pile onto the same posting list. It is not a
/// uniform shuffle.
///
/// Increments `read` per line. Returns the number of lines read; stops early if the parse stage
/// has gone away. `line_tx` is dropped on return, which closes the queue.
pub fn read_lines<R: Read, G: Rng>(
    reader: R,
    line_tx: Sender<String>,
    state: &PipelineState,
    window_capacity: usize,
    rng: &mut G,
) -> io::Result<u64> {
    let capacity = window_capacity.max(1);
    let mut reader = BufReader::new(reader);
    let mut raw = Vec::new();
    let mut line = String::new();
    let mut window: Vec<String> = Vec::with_capacity(capacity);
    let mut count = 0_u64;

    while window.len() < capacity {
        if !read_line(&mut reader, &mut raw, &mut line)? {
            break;
        }
        window.push(std::mem::take(&mut line));
        state.counters.incr_read();
        count += 1;
    }

    // Window full: each new line takes the slot of a random one, which goes out.
    while read_line(&mut reader, &mut raw, &mut line)? {
        state.counters.incr_read();
        count += 1;
        let k = rng.gen_range(0..window.len());
        let out = std::mem::replace(&mut window[k], std::mem::take(&mut line));
        if !send_unless_stopped(&line_tx, out, &state.errors) {
            log::debug!("line source: parse stage stopped after {} lines", count);
            return Ok(count);
        }
    }

    for out in window {
        if !send_unless_stopped(&line_tx, out, &state.errors) {
            log::debug!("line source: parse stage stopped after {} lines", count);
            break;
        }
    }
    drop(line_tx);
    Ok(count)
}

/// Run the line source on its own thread. An unreadable stream is fatal for the whole process:
/// the error is logged and the process exits.
pub fn spawn_line_source<R>(
    reader: R,
    line_tx: Sender<String>,
    state: Arc<PipelineState>,
    window_capacity: usize,
) -> JoinHandle<u64>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut rng = SmallRng::from_entropy();
        match read_lines(reader, line_tx, &state, window_capacity, &mut rng) {
            Ok(count) => {
                log::debug!("line source: {} lines read", count);
                count
            }
            Err(err) => {
                log::error!("Error while reading input: {}", err);
                std::process::exit(PipelineConsts::FATAL_READ_EXIT_CODE);
            }
        }
    })
}
