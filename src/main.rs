use clap::{App, Arg, SubCommand};
#[macro_use]
extern crate log;
use markseg::gen_seq;
use markseg::model::{DiceRollModel, GcPatchModel, MarkovModel};
use markseg::train::train_and_decode;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

fn subcommand_decode() -> App<'static, 'static> {
    SubCommand::with_name("decode")
        .version("0.1")
        .about("Decoding a sequence into state segments, retraining each round.")
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Debug mode"),
        )
        .arg(
            Arg::with_name("model")
                .long("model")
                .short("m")
                .takes_value(true)
                .default_value("dice")
                .possible_values(&["dice", "gc"])
                .help("Initial parameters. Dice rolls or GC patches."),
        )
        .arg(
            Arg::with_name("seq")
                .long("seq")
                .short("s")
                .value_name("SEQ")
                .takes_value(true)
                .help("Observed sequence. Sampled from the model if omitted."),
        )
        .arg(
            Arg::with_name("length")
                .long("length")
                .takes_value(true)
                .default_value("300")
                .help("Length of the sampled sequence."),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .takes_value(true)
                .default_value("32389")
                .help("Seed"),
        )
        .arg(
            Arg::with_name("rounds")
                .long("rounds")
                .short("r")
                .takes_value(true)
                .default_value("10")
                .help("Number of decode-reestimate rounds."),
        )
        .arg(
            Arg::with_name("state")
                .long("state")
                .takes_value(true)
                .default_value("1")
                .help("State index to list hits for."),
        )
        .arg(
            Arg::with_name("hits")
                .long("hits")
                .takes_value(true)
                .default_value("5")
                .help("Hits to print for all but the last round."),
        )
}

fn subcommand_simulate() -> App<'static, 'static> {
    SubCommand::with_name("simulate")
        .version("0.1")
        .about("Sampling a sequence and its hidden path from a model.")
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Debug mode"),
        )
        .arg(
            Arg::with_name("model")
                .long("model")
                .short("m")
                .takes_value(true)
                .default_value("dice")
                .possible_values(&["dice", "gc"])
                .help("Parameters to sample from. Dice rolls or GC patches."),
        )
        .arg(
            Arg::with_name("length")
                .long("length")
                .takes_value(true)
                .default_value("300")
                .help("Length of the sampled sequence."),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .takes_value(true)
                .default_value("32389")
                .help("Seed"),
        )
}

fn run_decode<M: MarkovModel>(model: M, matches: &clap::ArgMatches) -> std::io::Result<()> {
    let rounds: usize = matches
        .value_of("rounds")
        .and_then(|e| e.parse().ok())
        .unwrap();
    let state: usize = matches
        .value_of("state")
        .and_then(|e| e.parse().ok())
        .unwrap();
    let hits: usize = matches
        .value_of("hits")
        .and_then(|e| e.parse().ok())
        .unwrap();
    if state >= model.state_symbols().len() {
        let why = format!("no state {} in this model", state);
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, why));
    }
    let seq: Vec<u8> = match matches.value_of("seq") {
        Some(seq) => seq.trim().as_bytes().to_vec(),
        None => {
            let seed: u64 = matches
                .value_of("seed")
                .and_then(|e| e.parse().ok())
                .unwrap();
            let length: usize = matches
                .value_of("length")
                .and_then(|e| e.parse().ok())
                .unwrap();
            let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(seed);
            let (seq, path) = gen_seq::simulate(&model, &mut rng, length);
            debug!("TRUE\t{}", String::from_utf8_lossy(&path));
            seq
        }
    };
    let start = std::time::Instant::now();
    let results = train_and_decode(model, &seq, rounds)
        .map_err(|why| std::io::Error::new(std::io::ErrorKind::InvalidInput, why))?;
    println!("Timetaken: {}", start.elapsed().as_millis());
    for (i, result) in results.iter().enumerate() {
        println!("Iteration {}", i + 1);
        println!("---------------------------------------------------------------------------");
        if i + 1 < results.len() {
            println!("{}", result.report(state, hits));
        } else {
            println!("{}", result.report_all(state));
        }
        println!("{}", String::from_utf8_lossy(result.path()));
    }
    Ok(())
}

fn decode(matches: &clap::ArgMatches) -> std::io::Result<()> {
    match matches.value_of("model") {
        Some("gc") => run_decode(GcPatchModel::default(), matches),
        _ => run_decode(DiceRollModel::default(), matches),
    }
}

fn simulate(matches: &clap::ArgMatches) -> std::io::Result<()> {
    let seed: u64 = matches
        .value_of("seed")
        .and_then(|e| e.parse().ok())
        .unwrap();
    let length: usize = matches
        .value_of("length")
        .and_then(|e| e.parse().ok())
        .unwrap();
    let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(seed);
    let (seq, path) = match matches.value_of("model") {
        Some("gc") => gen_seq::simulate(&GcPatchModel::default(), &mut rng, length),
        _ => gen_seq::simulate(&DiceRollModel::default(), &mut rng, length),
    };
    println!("{}", String::from_utf8_lossy(&seq));
    println!("{}", String::from_utf8_lossy(&path));
    Ok(())
}

fn main() -> std::io::Result<()> {
    let matches = App::new("markseg")
        .version("0.1")
        .about("Decode:[SEQ]->Segments or Simulate:[MODEL]->SEQ")
        .setting(clap::AppSettings::ArgRequiredElseHelp)
        .subcommand(subcommand_decode())
        .subcommand(subcommand_simulate())
        .get_matches();
    if let Some(sub_m) = matches.subcommand().1 {
        let level = match sub_m.occurrences_of("verbose") {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    }
    debug!("Start");
    match matches.subcommand() {
        ("decode", Some(sub_m)) => decode(sub_m),
        ("simulate", Some(sub_m)) => simulate(sub_m),
        _ => unreachable!(),
    }
}
