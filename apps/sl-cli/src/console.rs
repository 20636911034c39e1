//! Interactive console: the widget layer of a terminal session.
//!
//! Each input line is one button press or text entry. Commands are queued to
//! the driver and applied between ticks, exactly like a GUI event loop.

use std::io::{BufRead, Write};

use sl_core::ParameterSet;
use sl_sim::{Command, Driver, ModelKind, ModelParams, Phase, Tuning};

use crate::error::AppResult;
use crate::sink::TextSink;

/// Seconds of simulation shown by `run` without an explicit frame count.
const DEFAULT_RUN_SECONDS: f64 = 10.0;

#[derive(Clone, Debug, PartialEq)]
pub enum Input {
    Command(Command),
    /// Start with `NAME=VALUE` entries applied to the current parameters.
    StartWith(Vec<(String, String)>),
    /// Advance `n` frames without pacing.
    Tick(u64),
    /// Paced frames until the run stops, or `n` frames.
    Run(Option<u64>),
    Show,
    Params,
    Help,
    Quit,
}

const HELP: &str = "\
commands:
  start | pause | resume | reset | halt
  start NAME=VALUE ...     start with edited parameters
  set NAME VALUE           edit a parameter (not while running)
  dt VALUE                 change the time step (not while running)
  tune COLUMN orifice|h0 VALUE
  load MODEL               switch model
  tick [N]                 advance N frames immediately
  run [N]                  paced frames until stopped (or N frames)
  show | params | help | quit";

fn number<T: std::str::FromStr>(word: Option<&str>, what: &str) -> Result<T, String> {
    let word = word.ok_or_else(|| format!("missing {what}"))?;
    word.parse()
        .map_err(|_| format!("{what} must be a number, got {word:?}"))
}

pub fn parse_line(line: &str) -> Result<Option<Input>, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let input = match head.to_ascii_lowercase().as_str() {
        "start" => {
            let entries = words
                .map(|word| {
                    word.split_once('=')
                        .map(|(name, text)| (name.to_string(), text.to_string()))
                        .ok_or_else(|| format!("expected NAME=VALUE, got {word:?}"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            if entries.is_empty() {
                Input::Command(Command::Start)
            } else {
                Input::StartWith(entries)
            }
        }
        "pause" => Input::Command(Command::Pause),
        "resume" => Input::Command(Command::Resume),
        "reset" => Input::Command(Command::Reset),
        "halt" | "stop" => Input::Command(Command::Halt),
        "set" => {
            let name = words.next().ok_or("usage: set NAME VALUE")?;
            // Text is validated by the session so bad entries are reported there.
            let text = words.next().ok_or("usage: set NAME VALUE")?;
            Input::Command(Command::SetParam {
                name: name.to_string(),
                text: text.to_string(),
            })
        }
        "dt" => Input::Command(Command::SetDt(number(words.next(), "dt")?)),
        "tune" => {
            let column = number(words.next(), "column")?;
            let field = words.next().ok_or("usage: tune COLUMN orifice|h0 VALUE")?;
            let value = number(words.next(), "value")?;
            let tuning = match field {
                "orifice" | "orifice_diameter" => Tuning::OrificeDiameter {
                    column,
                    diameter: value,
                },
                "h0" | "height" => Tuning::InitialHeight {
                    column,
                    height: value,
                },
                other => return Err(format!("unknown tuning field {other:?}")),
            };
            Input::Command(Command::Tune(tuning))
        }
        "load" => {
            let kind: ModelKind = words
                .next()
                .ok_or("usage: load MODEL")?
                .parse()
                .map_err(|e: sl_core::CoreError| e.to_string())?;
            Input::Command(Command::Load(ModelParams::defaults(kind)))
        }
        "tick" => Input::Tick(match words.next() {
            Some(word) => number(Some(word), "frame count")?,
            None => 1,
        }),
        "run" => Input::Run(match words.next() {
            Some(word) => Some(number(Some(word), "frame count")?),
            None => None,
        }),
        "show" => Input::Show,
        "params" => Input::Params,
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => return Err(format!("unknown command {other:?} (try help)")),
    };
    Ok(Some(input))
}

fn show<W: Write>(out: &mut W, driver: &Driver, sink: &TextSink) -> AppResult<()> {
    let snapshot = driver.session().snapshot();
    writeln!(
        out,
        "{}  t = {:.3} s  tick {}  [{}]",
        driver.session().model().kind().title(),
        snapshot.t,
        snapshot.tick,
        snapshot.phase
    )?;
    if let Some(regime) = snapshot.regime {
        writeln!(out, "  regime: {regime}")?;
    }
    for readout in &snapshot.readouts {
        writeln!(
            out,
            "  {:<20} {:>12.5} {}",
            readout.name, readout.value, readout.unit
        )?;
    }
    for (name, text) in sink.labels() {
        writeln!(out, "  {name}: {text}")?;
    }
    Ok(())
}

fn params<W: Write>(out: &mut W, driver: &Driver) -> AppResult<()> {
    let current = driver.session().params();
    let set = current.parameters();
    writeln!(out, "dt = {} s", driver.session().dt())?;
    for name in set.names() {
        let spec = set.spec_for(&name)?;
        let value = set.get(&name).unwrap_or(f64::NAN);
        writeln!(
            out,
            "  {:<28} {:>10} {:<8} [{}, {}]  {}",
            name, value, spec.unit, spec.min, spec.max, spec.label
        )?;
    }
    Ok(())
}

/// Apply `entries` to a copy of the current parameters and start with it.
fn start_with<W: Write>(
    out: &mut W,
    driver: &mut Driver,
    sink: &mut TextSink,
    entries: &[(String, String)],
) -> AppResult<()> {
    let mut params = driver.session().params();
    for (name, text) in entries {
        if let Err(err) = params.parameters_mut().set_from_text(name, text) {
            writeln!(out, "rejected: {err}")?;
            return Ok(());
        }
    }
    match driver.apply(sink, Command::StartWith(params)) {
        Ok(()) => writeln!(out, "ok [{}]", driver.session().phase())?,
        Err(err) => writeln!(out, "rejected: {err}")?,
    }
    Ok(())
}

/// Read commands from `input` until `quit` or end of input.
///
/// Rejected commands and failed ticks are reported on `out`; only I/O
/// failures end the console early.
pub fn run_console<R, W>(
    input: R,
    out: &mut W,
    driver: &mut Driver,
    sink: &mut TextSink,
) -> AppResult<()>
where
    R: BufRead,
    W: Write,
{
    driver.open(sink);
    let title = driver.session().model().kind().title();
    writeln!(out, "{title} (type help for commands)")?;

    for line in input.lines() {
        let line = line?;
        let parsed = match parse_line(&line) {
            Ok(Some(parsed)) => parsed,
            Ok(None) => continue,
            Err(message) => {
                writeln!(out, "error: {message}")?;
                continue;
            }
        };

        match parsed {
            Input::Command(command) => {
                if let Err(err) = driver.apply(sink, command) {
                    writeln!(out, "rejected: {err}")?;
                } else {
                    writeln!(out, "ok [{}]", driver.session().phase())?;
                }
            }
            Input::StartWith(entries) => start_with(out, driver, sink, &entries)?,
            Input::Tick(n) => {
                for _ in 0..n {
                    if let Err(err) = driver.frame(sink, []) {
                        writeln!(out, "error: {err}")?;
                        break;
                    }
                }
                show(out, driver, sink)?;
            }
            Input::Run(frames) => {
                if driver.session().phase() != Phase::Running {
                    writeln!(out, "not running (start or resume first)")?;
                    continue;
                }
                let session = driver.session();
                let max_frames = frames.unwrap_or_else(|| {
                    (DEFAULT_RUN_SECONDS / session.dt()).ceil() as u64
                });
                match driver.run(sink, max_frames, |_| Vec::new()) {
                    Ok(summary) => writeln!(
                        out,
                        "{} frames, t = {:.3} s [{}]",
                        summary.frames, summary.t, summary.phase
                    )?,
                    Err(err) => writeln!(out, "error: {err}")?,
                }
            }
            Input::Show => show(out, driver, sink)?,
            Input::Params => params(out, driver)?,
            Input::Help => writeln!(out, "{HELP}")?,
            Input::Quit => break,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sl_core::RateLimiter;
    use sl_sim::{Session, StopReason};

    #[test]
    fn parses_buttons_and_entries() {
        assert_eq!(parse_line("  ").unwrap(), None);
        assert_eq!(
            parse_line("START").unwrap(),
            Some(Input::Command(Command::Start))
        );
        assert_eq!(
            parse_line("set k 0.8").unwrap(),
            Some(Input::Command(Command::SetParam {
                name: "k".into(),
                text: "0.8".into()
            }))
        );
        assert_eq!(
            parse_line("tune 1 orifice 0.1").unwrap(),
            Some(Input::Command(Command::Tune(Tuning::OrificeDiameter {
                column: 1,
                diameter: 0.1
            })))
        );
        assert_eq!(
            parse_line("start k=0.8 r=1").unwrap(),
            Some(Input::StartWith(vec![
                ("k".into(), "0.8".into()),
                ("r".into(), "1".into())
            ]))
        );
        assert_eq!(parse_line("tick 5").unwrap(), Some(Input::Tick(5)));
        assert_eq!(parse_line("run").unwrap(), Some(Input::Run(None)));
        assert_eq!(
            parse_line("load spring-mass").unwrap(),
            Some(Input::Command(Command::Load(ModelParams::defaults(
                ModelKind::SpringMass
            ))))
        );
    }

    #[test]
    fn reports_bad_lines() {
        assert!(parse_line("set k").is_err());
        assert!(parse_line("start k").is_err());
        assert!(parse_line("dt fast").is_err());
        assert!(parse_line("tune 0 width 1").is_err());
        assert!(parse_line("load pendulum").is_err());
        assert!(parse_line("fly").is_err());
    }

    #[test]
    fn scripted_session() {
        let params = ModelParams::defaults(ModelKind::DrainingTank);
        let session = Session::with_default_dt(params).unwrap();
        let mut driver = Driver::new(session, RateLimiter::unpaced());
        let mut sink = TextSink::new();
        let script = "set k abc\nset k 1.2\nstart\nset k 0.5\ntick 3\nrun\nshow\nquit\nstart\n";
        let mut out = Vec::new();

        run_console(script.as_bytes(), &mut out, &mut driver, &mut sink).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("rejected: Cannot parse k from 'abc'"), "{text}");
        assert!(text.contains("Cannot update parameters while running"), "{text}");
        assert!(text.contains("stopped (tank empty)"), "{text}");
        assert_eq!(
            driver.session().phase(),
            Phase::Stopped(StopReason::Empty)
        );
        match driver.session().params() {
            ModelParams::DrainingTank(p) => assert_eq!(p.k, 1.2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn diverged_run_keeps_the_console_alive() {
        let params = ModelParams::defaults(ModelKind::SpringMass);
        let session = Session::with_default_dt(params).unwrap();
        let mut driver = Driver::new(session, RateLimiter::unpaced());
        let mut sink = TextSink::new();
        let script = "dt 1\nstart k=fast\nstart k=20 mass=0.1\ntick 2000\nrun\nshow\nquit\n";
        let mut out = Vec::new();

        run_console(script.as_bytes(), &mut out, &mut driver, &mut sink).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("rejected: Cannot parse k from 'fast'"), "{text}");
        assert!(text.contains("error: Non-physical condition"), "{text}");
        assert!(text.contains("not running"), "{text}");
        assert!(text.contains("[stopped (diverged)]"), "{text}");
        assert_eq!(
            driver.session().phase(),
            Phase::Stopped(StopReason::Diverged)
        );
        assert!(driver.session().state().is_finite());
        match driver.session().params() {
            ModelParams::SpringMass(p) => assert_eq!((p.k, p.mass), (20.0, 0.1)),
            other => panic!("unexpected {other:?}"),
        }
    }
}
