use nalgebra::Vector3;

/// speed of light (m/s)
pub const CLIGHT: f64 = 299792458.0;
/// earth angular velocity (rad/s)
pub const OMGE: f64 = 7.2921151467e-5;
/// earth mass (kg)
pub const EARTH_MASS: f64 = 5.9722e24;
/// gravitational constant (m^3 kg^-1 s^-2)
pub const GRAV_CONST: f64 = 6.67430e-11;
/// earth standard gravitational parameter mu = GM (m^3/s^2)
pub const MU: f64 = GRAV_CONST * EARTH_MASS;
/// seconds per solar day
pub const SOLAR_DAY: f64 = 86400.0;
/// seconds per GPS week
pub const WEEK_SECONDS: f64 = 604800.0;

pub const PI: f64 = std::f64::consts::PI;
/// rad to deg
pub const R2D: f64 = 180.0 / PI;
/// deg to rad
pub const D2R: f64 = PI / 180.0;

/// number of GPS PRNs (tables are indexed 1..=MAX_SAT, slot 0 unused)
pub const MAX_SAT: usize = 32;
/// max observation epochs per PRN
pub const MAX_EPOCHS: usize = 100000;
/// max ephemeris issues per PRN
pub const MAX_EPH_HISTORY: usize = 4096;
/// max entries of the unique epoch list fed to the solver
pub const MAX_UNIQUE_EPOCHS: usize = 100000;

/// max number of iterations for point positioning
pub const MAXITR: usize = 10;
/// min satellites for a position fix
pub const MIN_SATS: usize = 4;
/// max number of iterations of Kepler
pub const MAX_ITER_KEPLER: usize = 10;
/// tolerance for Kepler equation (rad)
pub const RTOL_KEPLER: f64 = 1E-12;
/// pivot threshold treated as singular in the 4x4 inverse
pub const SINGULAR_PIVOT: f64 = 1E-18;
/// true anomaly step of the orbit sweep (rad)
pub const ORBIT_STEP: f64 = 0.01;

/// GPS broadcast ephemeris (RTCM 1019), angular fields already scaled to
/// radians and eccentricity to its unitless value
#[derive(Debug, Clone, Copy, Default)]
pub struct Eph {
    pub prn: usize, // satellite PRN (DF009)
    pub week: i32,  // GPS week number (DF076)
    pub sva: i32,   // SV accuracy, URA index (DF077)
    pub code: i32,  // code on L2 (DF078)
    pub iode: i32,  // IODE (DF071)
    pub iodc: i32,  // IODC (DF085)
    pub svh: i32,   // SV health (DF102)
    pub flag: i32,  // L2 P data flag (DF103)
    pub fit: i32,   // fit interval flag (DF137)
    pub toc: u32,   // time of clock (s of week, DF081)
    pub toe: u32,   // time of ephemeris (s of week, DF093)
    // SV orbit parameters
    pub a: f64,      // semi-major axis (m), sqrt_a squared
    pub sqrt_a: f64, // as broadcast (DF092)
    pub e: f64,      // eccentricity (DF090 * 2^-33)
    pub i0: f64,     // inclination (rad, DF097 * PI)
    pub omg0: f64,   // RAAN (rad, DF095 * PI)
    pub omg: f64,    // argument of perigee (rad, DF099 * PI)
    pub m0: f64,     // mean anomaly (rad, DF088 * PI)
    pub deln: f64,   // mean motion correction (DF087)
    pub omgd: f64,   // RAAN rate (DF100)
    pub idot: f64,   // inclination rate (DF079)
    pub crc: f64,
    pub crs: f64,
    pub cuc: f64,
    pub cus: f64,
    pub cic: f64,
    pub cis: f64,
    // SV clock parameters
    pub f0: f64, // af0 (DF084)
    pub f1: f64, // af1 (DF083)
    pub f2: f64, // af2 (DF082)
    pub tgd: f64, // group delay (DF101)
}

/// MSM4 observation message (RTCM 1074), cells filtered to L1 C/A ("1C")
#[derive(Debug, Clone, Default)]
pub struct Msm4 {
    pub msg_type: u16, // DF002
    pub staid: u16,    // DF003
    pub tow_ms: u32,   // GPS epoch time (ms of week, DF004)
    pub sync: u8,      // DF393
    pub iods: u8,      // DF409
    pub clk_steering: u8, // DF411
    pub ext_clock: u8, // DF412
    pub nsat: usize,
    pub nsig: usize,
    pub ncell: usize, // rewritten to the retained L1 cell count
    // per-satellite, in PRN_xx order
    pub prn: Vec<usize>,
    pub rough_ms: Vec<u32>,    // rough range integer (ms, DF397)
    pub rough_mod1s: Vec<f64>, // rough range modulo 1 s (DF398)
    // per retained L1 cell, aligned with the satellite order
    pub cell_prn: Vec<usize>,
    pub fine: Vec<f64>,  // fine pseudorange (DF400)
    pub phase: Vec<f64>, // fine phase range (DF401)
    pub lock: Vec<u8>,   // lock time indicator (DF402)
    pub half_amb: Vec<u8>, // half-cycle ambiguity (DF420)
    pub cnr: Vec<u8>,    // carrier-to-noise ratio (DF403)
    pub pseudorange: Vec<f64>, // recombined full pseudorange (m), -1.0 invalid
}

/// legacy L1 observation message (RTCM 1002)
#[derive(Debug, Clone, Default)]
pub struct Msm1 {
    pub msg_type: u16, // DF002
    pub staid: u16,    // DF003
    pub tow_ms: u32,   // GPS epoch time (ms of week, DF004)
    pub sync: u8,      // DF005
    pub nsat: usize,   // DF006
    pub smooth: u8,    // DF007
    pub smooth_int: u8, // DF008
    // per-satellite
    pub prn: Vec<usize>,       // DF009
    pub code_ind: Vec<u8>,     // DF010
    pub remainder: Vec<f64>,   // L1 pseudorange remainder (m, DF011)
    pub phase_diff: Vec<f64>,  // phaserange - pseudorange (m, DF012)
    pub lock: Vec<u8>,         // DF013
    pub amb_ms: Vec<u32>,      // rough range ambiguity (ms, DF014)
    pub cnr: Vec<f64>,         // DF015
    pub pseudorange: Vec<f64>, // recombined full pseudorange (m)
}

/// Keplerian elements selected for one observation slot
#[derive(Debug, Clone, Copy)]
pub struct KeplerSet {
    pub a: f64,
    pub e: f64,
    pub i0: f64,
    pub omg0: f64,
    pub omg: f64,
    pub m0: f64,
    pub toe: u32,
}

impl KeplerSet {
    pub fn from_eph(eph: &Eph) -> Self {
        KeplerSet {
            a: eph.a,
            e: eph.e,
            i0: eph.i0,
            omg0: eph.omg0,
            omg: eph.omg,
            m0: eph.m0,
            toe: eph.toe,
        }
    }
}

/// per-PRN observation series with the ephemeris chosen for each slot,
/// indexed by the PRN's arrival order (t_obs == 0 marks an empty slot)
#[derive(Debug, Clone, Default)]
pub struct SatSeries {
    pub prn: usize,
    pub pseudorange: Vec<f64>,
    pub t_obs: Vec<u32>, // ms of GPS week
    pub kepler: Vec<Option<KeplerSet>>,
}

impl SatSeries {
    pub fn len(&self) -> usize {
        self.t_obs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t_obs.is_empty()
    }

    /// observation slots carrying a usable pseudorange
    pub fn valid_count(&self) -> usize {
        self.pseudorange.iter().filter(|&&p| p > 0.0).count()
    }
}

/// per-PRN propagated satellite states, parallel to the series slots
#[derive(Debug, Clone, Default)]
pub struct SatStates {
    pub prn: usize,
    pub eci: Vec<Option<Vector3<f64>>>,
    pub ecef: Vec<Option<Vector3<f64>>>,
    pub t_ms: Vec<u32>,
}

/// full-revolution orbit trace of one PRN (visualization dataset)
#[derive(Debug, Clone, Default)]
pub struct OrbitTrace {
    pub prn: usize,
    pub pqw: Vec<Vector3<f64>>,
    pub eci: Vec<Vector3<f64>>,
}

/// receiver solution per unique observation epoch; a None slot is an epoch
/// skipped for lack of satellites or singular geometry
#[derive(Debug, Clone, Default)]
pub struct ReceiverTrack {
    pub t_ms: Vec<u32>,
    pub ecef: Vec<Option<Vector3<f64>>>,
    pub lla: Vec<Option<[f64; 3]>>, // lat (deg), lon (deg), alt (m)
}

impl ReceiverTrack {
    pub fn solved_count(&self) -> usize {
        self.ecef.iter().filter(|p| p.is_some()).count()
    }
}

/// non-fatal event counters surfaced by the driver summary
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub lines: usize,
    pub skipped_lines: usize,
    pub malformed: usize,
    pub unsupported: usize,
    pub eph_msgs: usize,
    pub obs_msgs: usize,
    pub capacity_drops: usize,
    pub missing_eph: usize,
    pub numeric_drops: usize,
    pub epochs: usize,
    pub skipped_epochs: usize,
    pub singular_epochs: usize,
    pub solved_epochs: usize,
}

impl RunStats {
    pub fn summary(&self) -> String {
        format!(
            "lines: {} read, {} skipped, {} malformed, {} unsupported type\n\
             messages: {} ephemeris, {} observation, {} capacity drops\n\
             series: {} slots without ephemeris, {} propagation drops\n\
             epochs: {} unique, {} solved, {} under {} SVs, {} singular\n",
            self.lines,
            self.skipped_lines,
            self.malformed,
            self.unsupported,
            self.eph_msgs,
            self.obs_msgs,
            self.capacity_drops,
            self.missing_eph,
            self.numeric_drops,
            self.epochs,
            self.solved_epochs,
            self.skipped_epochs,
            MIN_SATS,
            self.singular_epochs,
        )
    }
}
