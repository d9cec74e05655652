use std::fs::File;
use std::io::BufWriter;
use clap::{Parser, Subcommand};
use lpr::engine::driver::{run_file, scan_file};
use lpr::engine::series::series_summary;
use lpr::timer::stage_report;

#[derive(Parser, Debug)]
#[command(
    name = "LPR",
    about = "A GPS L1 position resolver for text-parsed RTCM3 logs.",
    after_help = "Input is one RTCM message per line, rendered as DFxxx=value fields \
                  (e.g. a PyRTCM dump). Supported message types: 1002, 1019, 1074."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve receiver positions from a parsed RTCM3 log
    Solve {
        /// Input parsed RTCM3 file
        #[clap(short = 'i', long = "inp")]
        ifile: String,

        /// Output receiver track file
        #[clap(short = 'o', long = "pos")]
        posfile: Option<String>,

        /// Output satellite ECEF history file
        #[clap(short = 's', long = "sat")]
        satfile: Option<String>,

        /// Output satellite orbit trace file
        #[clap(short = 'b', long = "orbit")]
        orbitfile: Option<String>,
    },

    /// Decode a parsed RTCM3 log and print the satellite tables
    Scan {
        /// Input parsed RTCM3 file
        #[clap(short = 'i', long = "inp")]
        ifile: String,
    },
}

fn main() {
    env_logger::init();
    let args = Cli::parse();

    match args.command {
        Commands::Solve {
            ifile,
            posfile,
            satfile,
            orbitfile,
        } => {
            if ifile.is_empty() {
                eprintln!("Please set input file!");
                return;
            }
            println!("input file:{}", ifile);

            let resolved = match run_file(&ifile) {
                Ok(resolved) => resolved,
                Err(e) => {
                    eprintln!("pipeline error: {}", e);
                    std::process::exit(1);
                }
            };

            print!("{}", resolved.stats.summary());
            print!("{}", stage_report());

            if let Some(path) = posfile {
                match File::create(&path) {
                    Ok(file) => {
                        let mut writer = BufWriter::new(file);
                        if let Err(e) = resolved.write_track(&mut writer) {
                            eprintln!("Fail to write {}: {}", path, e);
                        } else {
                            println!("output file:{}", path);
                        }
                    }
                    Err(e) => eprintln!("Fail to create {}: {}", path, e),
                }
            }
            if let Some(path) = satfile {
                match File::create(&path) {
                    Ok(file) => {
                        let mut writer = BufWriter::new(file);
                        if let Err(e) = resolved.write_sat_ecef(&mut writer) {
                            eprintln!("Fail to write {}: {}", path, e);
                        } else {
                            println!("output file:{}", path);
                        }
                    }
                    Err(e) => eprintln!("Fail to create {}: {}", path, e),
                }
            }
            if let Some(path) = orbitfile {
                match File::create(&path) {
                    Ok(file) => {
                        let mut writer = BufWriter::new(file);
                        if let Err(e) = resolved.write_orbits(&mut writer) {
                            eprintln!("Fail to write {}: {}", path, e);
                        } else {
                            println!("output file:{}", path);
                        }
                    }
                    Err(e) => eprintln!("Fail to create {}: {}", path, e),
                }
            }
        }

        Commands::Scan { ifile } => {
            if ifile.is_empty() {
                eprintln!("Please set input file!");
                return;
            }
            println!("input file:{}", ifile);

            match scan_file(&ifile) {
                Ok((series, stats)) => {
                    print!("{}", series_summary(&series));
                    print!("{}", stats.summary());
                }
                Err(e) => {
                    eprintln!("scan error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
