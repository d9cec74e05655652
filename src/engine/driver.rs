use crate::basic::func::openfile;
use crate::basic::time::timestr_utc;
use crate::basic::var::*;
use crate::decode::msg::{decode_1002, decode_1019, decode_1074, msg_type};
use crate::decode::store::History;
use crate::engine::orbit::{orbit_traces, propagate};
use crate::engine::series::{build_series, eph_series};
use crate::engine::spp::estimate_positions;
use crate::error::Error;
use crate::timer::time_stage;
use indicatif::{ProgressBar, ProgressStyle};
use log::warn;
use std::io::Write;
use std::path::Path;

/// Everything the pipeline produces, read-only once built.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub series: Vec<SatSeries>,
    pub states: Vec<SatStates>,
    pub orbits: Vec<OrbitTrace>,
    pub track: ReceiverTrack,
    pub stats: RunStats,
}

/// Run the full pipeline over a parsed RTCM log file.
pub fn run_file<P: AsRef<Path>>(path: P) -> Result<Resolved, Error> {
    let lines = openfile(path)?;
    run_lines(lines.map_while(|l| l.ok()))
}

/// Run the full pipeline over pre-read lines:
/// READ -> SORT -> PROPAGATE -> SOLVE -> EMIT, each stage exactly once.
pub fn run_lines<I>(lines: I) -> Result<Resolved, Error>
where
    I: IntoIterator<Item = String>,
{
    let mut stats = RunStats::default();

    let hist = time_stage("read", || read_stream(lines, &mut stats))?;

    let (series, ephs) = time_stage("sort", || {
        build_series(&hist, &mut stats).map(|series| (series, eph_series(&hist)))
    })?;

    let (states, orbits) = time_stage("propagate", || {
        (propagate(&series, &mut stats), orbit_traces(&ephs))
    });

    let track = time_stage("solve", || estimate_positions(&series, &states, &mut stats));

    Ok(Resolved {
        series,
        states,
        orbits,
        track,
        stats,
    })
}

/// Decode-and-store only (the `scan` mode): stops after the series build.
pub fn scan_file<P: AsRef<Path>>(path: P) -> Result<(Vec<SatSeries>, RunStats), Error> {
    let mut stats = RunStats::default();
    let lines = openfile(path)?;
    let hist = read_stream(lines.map_while(|l| l.ok()), &mut stats)?;
    let series = build_series(&hist, &mut stats)?;
    Ok((series, stats))
}

fn read_stream<I>(lines: I, stats: &mut RunStats) -> Result<History, Error>
where
    I: IntoIterator<Item = String>,
{
    let mut hist = History::new();

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("/|\\- ")
            .template("{spinner:.green} {msg}")
            .expect("Failed to set progress style"),
    );
    pb.set_message("Reading rtcm...");

    for line in lines {
        pb.tick();
        stats.lines += 1;

        if line.is_empty() || line.starts_with('#') || line.starts_with(char::is_whitespace) {
            stats.skipped_lines += 1;
            continue;
        }

        match msg_type(&line) {
            None => {
                warn!("{}", Error::InputMalformed(String::from("no DF002 field")));
                stats.malformed += 1;
            }
            Some(1019) => match decode_1019(&line) {
                Ok(eph) => hist.store_ephemeris(eph, stats),
                Err(e) => {
                    warn!("{}", e);
                    stats.malformed += 1;
                }
            },
            Some(1074) => match decode_1074(&line) {
                Ok(msm4) => hist.store_msm4(msm4, stats)?,
                Err(e) => {
                    warn!("{}", e);
                    stats.malformed += 1;
                }
            },
            Some(1002) => match decode_1002(&line) {
                Ok(msm1) => hist.store_msm1(msm1, stats)?,
                Err(e) => {
                    warn!("{}", e);
                    stats.malformed += 1;
                }
            },
            Some(_) => stats.unsupported += 1,
        }
    }
    pb.finish_and_clear();

    Ok(hist)
}

impl Resolved {
    /// Receiver track, one line per solved epoch:
    /// `epoch t_ms x y z lat lon alt`.
    pub fn write_track<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "% receiver track ({})", timestr_utc())?;
        writeln!(writer, "% epoch  t(ms)  x(m)  y(m)  z(m)  lat(deg)  lon(deg)  alt(m)")?;
        for (ti, &t) in self.track.t_ms.iter().enumerate() {
            let (ecef, lla) = match (self.track.ecef[ti], self.track.lla[ti]) {
                (Some(ecef), Some(lla)) => (ecef, lla),
                _ => continue,
            };
            writeln!(
                writer,
                "{:6} {:10} {:14.4} {:14.4} {:14.4} {:14.9} {:14.9} {:10.3}",
                ti, t, ecef[0], ecef[1], ecef[2], lla[0], lla[1], lla[2]
            )?;
        }
        Ok(())
    }

    /// Per-PRN propagated satellite ECEF history:
    /// `prn k t_ms x y z`.
    pub fn write_sat_ecef<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "% satellite ecef history ({})", timestr_utc())?;
        for st in self.states.iter().skip(1) {
            for (k, ecef) in st.ecef.iter().enumerate() {
                let ecef = match ecef {
                    Some(ecef) => ecef,
                    None => continue,
                };
                writeln!(
                    writer,
                    "{:3} {:6} {:10} {:14.3} {:14.3} {:14.3}",
                    st.prn, k, st.t_ms[k], ecef[0], ecef[1], ecef[2]
                )?;
            }
        }
        Ok(())
    }

    /// Per-PRN full-orbit ECI trace: `prn s x y z`.
    pub fn write_orbits<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "% satellite orbit trace ({})", timestr_utc())?;
        for trace in self.orbits.iter().skip(1) {
            for (s, eci) in trace.eci.iter().enumerate() {
                writeln!(
                    writer,
                    "{:3} {:6} {:14.3} {:14.3} {:14.3}",
                    trace.prn, s, eci[0], eci[1], eci[2]
                )?;
            }
        }
        Ok(())
    }
}
