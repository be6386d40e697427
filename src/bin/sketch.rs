use anyhow::{ensure, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use probstream::{BloomFilter, Cardinality, HyperLogLog, SetMembership};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

const NEGATIVE_KEY_LENGTH: usize = 20;

#[derive(Parser, Debug)]
#[command(about = "Compares probabilistic sketches with exact containers on CSV data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Times membership queries on a set, a list and a Bloom filter.
    Bloom(BloomArgs),
    /// Compares exact distinct counts with HyperLogLog estimates.
    Hll(HllArgs),
}

#[derive(Args, Debug)]
struct BloomArgs {
    /// A CSV file with a header row.
    path: PathBuf,
    /// The column holding the keys.
    #[arg(short, long)]
    column: String,
    /// Use the addresses listed after `From:` and `To:` in the column
    /// instead of the whole value.
    #[arg(short, long)]
    emails: bool,
    /// The target false positive rate of the filter.
    #[arg(long, default_value_t = 0.001)]
    fp_rate: f64,
    /// The number of keys queried that are known to be present.
    #[arg(long, default_value_t = 10_000)]
    positives: usize,
    /// The number of random keys queried.
    #[arg(long, default_value_t = 10_000)]
    negatives: usize,
    /// A seed for the generator of random keys.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

#[derive(Args, Debug)]
struct HllArgs {
    /// A CSV file.
    path: PathBuf,
    /// The precision of the estimators.
    #[arg(short, long, default_value_t = 16)]
    precision: usize,
    /// Zero-based indices of columns whose values are counted too.
    #[arg(short, long, value_delimiter = ',')]
    columns: Vec<usize>,
    /// The first row is data, not a header.
    #[arg(long)]
    no_headers: bool,
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init()?;

    match Cli::parse().command {
        Command::Bloom(args) => bloom(args),
        Command::Hll(args) => hll(args),
    }
}

fn bloom(args: BloomArgs) -> Result<()> {
    let keys = read_keys(&args)?;
    let num_items = keys.len();
    ensure!(num_items > 0, "no keys found in column {}", args.column);
    info!("read {} distinct keys from {}", num_items, args.path.display());

    let mut list = Vec::with_capacity(num_items);
    let mut filter = BloomFilter::<String>::new(num_items, args.fp_rate)?;
    for key in &keys {
        // Keys are distinct, so the list skips the duplicate check.
        list.push(key.clone());
        filter.add(key);
    }
    info!(
        "bloom filter uses {} bits and {} hashes",
        filter.num_bits(),
        filter.num_hashes()
    );

    println!();
    println!("Number of keys: {num_items}");
    println!();

    let positives: Vec<String> = keys.iter().take(args.positives).cloned().collect();
    let set_time = time_queries(&keys, &positives, Some(positives.len()), "set")?;
    let list_time = time_queries(&list, &positives, Some(positives.len()), "list")?;
    let filter_time = time_queries(
        &filter,
        &positives,
        Some(positives.len()),
        "bloom filter",
    )?;

    println!("Positive queries ({})", positives.len());
    println!("Simple set: {:?}", set_time.0);
    println!("Simple list: {:?}", list_time.0);
    println!("Bloom filter: {:?}", filter_time.0);
    println!();

    let mut rng = StdRng::seed_from_u64(args.seed);
    let negatives: Vec<String> = std::iter::repeat_with(|| random_key(&mut rng))
        .filter(|key| !keys.contains(key))
        .take(args.negatives)
        .collect();
    let set_time = time_queries(&keys, &negatives, Some(0), "set")?;
    let list_time = time_queries(&list, &negatives, Some(0), "list")?;
    let (filter_time, false_positives) =
        time_queries(&filter, &negatives, None, "bloom filter")?;

    println!("Negative queries ({})", negatives.len());
    println!("Simple set: {:?}", set_time.0);
    println!("Simple list: {:?}", list_time.0);
    println!("Bloom filter: {:?}", filter_time);
    println!(
        "- False positive rate: {} (target {})",
        false_positives as f64 / negatives.len() as f64,
        args.fp_rate
    );

    Ok(())
}

/// Reads the keys of `args.column`, or the addresses in its mail headers.
fn read_keys(args: &BloomArgs) -> Result<HashSet<String>> {
    let mut reader = csv::Reader::from_path(&args.path)
        .with_context(|| format!("cannot open {}", args.path.display()))?;
    let index = reader
        .headers()?
        .iter()
        .position(|header| header == args.column)
        .with_context(|| format!("no column named {}", args.column))?;
    let addresses = Regex::new(r"(?:From|To): ([\w.-]+@[\w.-]+(?:,\s*[\w.-]+@[\w.-]+)*)")?;

    let mut keys = HashSet::new();
    for record in reader.records() {
        let record = record?;
        let Some(value) = record.get(index) else {
            continue;
        };
        if args.emails {
            for captures in addresses.captures_iter(value) {
                keys.extend(captures[1].split(',').map(|a| a.trim().to_string()));
            }
        } else {
            keys.insert(value.to_string());
        }
    }
    Ok(keys)
}

fn random_key(rng: &mut impl Rng) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(NEGATIVE_KEY_LENGTH)
        .map(char::from)
        .collect()
}

/// Times `contains` over `queries` and returns the elapsed time and the
/// number of hits. When `expected_hits` is given, any other count is an
/// error.
fn time_queries<S: SetMembership<String>>(
    set: &S,
    queries: &[String],
    expected_hits: Option<usize>,
    name: &str,
) -> Result<(Duration, usize)> {
    let start = Instant::now();
    let hits = queries.iter().filter(|query| set.contains(query)).count();
    let elapsed = start.elapsed();

    if let Some(expected) = expected_hits {
        ensure!(
            hits == expected,
            "{name} answered {hits} of {} queries positively, expected {expected}",
            queries.len()
        );
    }
    Ok((elapsed, hits))
}

fn hll(args: HllArgs) -> Result<()> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(!args.no_headers)
        .flexible(true)
        .from_path(&args.path)
        .with_context(|| format!("cannot open {}", args.path.display()))?;

    let mut rows = Counter::new("row".to_string(), args.precision)?;
    let mut columns = args
        .columns
        .iter()
        .map(|index| Counter::new(format!("column {index}"), args.precision))
        .collect::<Result<Vec<_>>>()?;

    let mut num_records = 0usize;
    for record in reader.records() {
        let record = record?;
        rows.add(record.iter().collect::<Vec<_>>().join(","));
        for (counter, &index) in columns.iter_mut().zip(&args.columns) {
            if let Some(value) = record.get(index) {
                counter.add(value.to_string());
            }
        }
        num_records += 1;
    }
    info!("read {} records from {}", num_records, args.path.display());

    rows.report();
    for counter in &columns {
        counter.report();
    }
    Ok(())
}

/// Exact and estimated distinct counts of one stream of values.
struct Counter {
    name: String,
    exact: HashSet<String>,
    estimate: HyperLogLog<String>,
}

impl Counter {
    fn new(name: String, precision: usize) -> Result<Self> {
        Ok(Self {
            name,
            exact: HashSet::new(),
            estimate: HyperLogLog::new(precision)?,
        })
    }

    fn add(&mut self, value: String) {
        Cardinality::add(&mut self.estimate, &value);
        Cardinality::add(&mut self.exact, &value);
    }

    fn report(&self) {
        let real = Cardinality::count(&self.exact);
        let estimated = Cardinality::count(&self.estimate);
        let error = if real > 0 {
            100. * (estimated as f64 - real as f64) / real as f64
        } else {
            0.
        };
        println!("     Real {} count: {}", self.name, real);
        println!(
            "Estimated {} count: {} ({:+.2}%)",
            self.name, estimated, error
        );
    }
}
