use std::process;
use std::str::FromStr;
use std::time::Instant;

use anyhow::Context;
use clap::{ArgAction, CommandFactory, Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use kmeans_rust::config::{
    Config, Engine, DEFAULT_CLUSTERS, DEFAULT_DIM, DEFAULT_GRID_SIZE, DEFAULT_POINTS, DEFAULT_THREADS,
};
use kmeans_rust::generate::populate;
use kmeans_rust::report::format_means;
use kmeans_rust::{Dataset, Schedule};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScheduleKind {
    Static,
    Dynamic,
    Guided,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EngineKind {
    Barrier,
    Rayon,
    Single,
}

/// 並列 k-means（Lloyd 法）ベンチマーク
#[derive(Parser, Debug)]
#[command(name = "kmeans", disable_help_flag = true)]
struct Cli {
    /// ベクトルの次元
    #[arg(short = 'd', value_name = "vector dimension", default_value_t = DEFAULT_DIM, value_parser = positive::<usize>)]
    dim: usize,

    /// クラスタ数
    #[arg(short = 'c', value_name = "num clusters", default_value_t = DEFAULT_CLUSTERS, value_parser = positive::<usize>)]
    clusters: usize,

    /// 点の数
    #[arg(short = 'p', value_name = "num points", default_value_t = DEFAULT_POINTS, value_parser = positive::<usize>)]
    points: usize,

    /// 各次元の座標の上限
    #[arg(short = 's', value_name = "grid size", default_value_t = DEFAULT_GRID_SIZE, value_parser = positive::<i32>)]
    grid_size: i32,

    /// ワーカースレッド数
    #[arg(short = 't', value_name = "threads", default_value_t = DEFAULT_THREADS, value_parser = positive::<usize>)]
    threads: usize,

    /// 作業分割の方式
    #[arg(long, value_enum, env = "KMEANS_SCHEDULE", default_value_t = ScheduleKind::Static)]
    schedule: ScheduleKind,

    /// dynamic のチャンクサイズ / guided の最小チャンクサイズ
    #[arg(long, env = "KMEANS_CHUNK", default_value_t = 1, value_parser = positive::<usize>)]
    chunk: usize,

    /// 点生成の乱数シード
    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long, value_enum, default_value_t = EngineKind::Barrier)]
    engine: EngineKind,

    /// 使い方を表示して終了
    #[arg(short = 'h', long = "help", short_alias = '?', action = ArgAction::SetTrue)]
    help: bool,
}

impl Cli {
    fn into_config(self) -> Config {
        let schedule = match self.schedule {
            ScheduleKind::Static => Schedule::Static,
            ScheduleKind::Dynamic => Schedule::Dynamic { chunk: self.chunk },
            ScheduleKind::Guided => Schedule::Guided { min_chunk: self.chunk },
        };
        let engine = match self.engine {
            EngineKind::Barrier => Engine::Barrier,
            EngineKind::Rayon => Engine::Rayon,
            EngineKind::Single => Engine::Single,
        };
        Config {
            dim: self.dim,
            clusters: self.clusters,
            points: self.points,
            grid_size: self.grid_size,
            threads: self.threads,
            schedule,
            seed: self.seed,
            engine,
        }
    }
}

fn positive<T>(s: &str) -> Result<T, String>
where
    T: FromStr + PartialOrd + Default,
{
    match s.trim().parse::<T>() {
        Ok(v) if v > T::default() => Ok(v),
        _ => Err("All values must be numeric and greater than 0".to_string()),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    if cli.help {
        println!("{}", Cli::command().render_help());
        process::exit(1);
    }

    let config = cli.into_config();
    config.validate()?;

    println!("Dimension = {}", config.dim);
    println!("Number of clusters = {}", config.clusters);
    println!("Number of points = {}", config.points);
    println!("Size of each dimension = {}", config.grid_size);
    println!("Number of threads = {}", config.threads);

    let mut dataset = Dataset::allocate(&config).context("Could not allocate application memory")?;
    println!("Generating points");
    println!("Generating means");
    populate(&mut dataset, config.grid_size, config.seed);

    println!("Starting iterative algorithm with {} threads\n", config.threads);
    let begin = Instant::now();
    let summary = kmeans_rust::run(&config, &mut dataset)?;
    let elapsed = begin.elapsed();

    for line in summary.iteration_lines() {
        println!("{}", line);
    }
    tracing::info!(iterations = summary.iterations, "converged");

    println!("\n\nFinal means:");
    print!("{}", format_means(&dataset));
    println!("kmeans: Completed {:.6}\n", elapsed.as_secs_f64());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_rejects_zero_negative_and_garbage() {
        assert!(positive::<usize>("0").is_err());
        assert!(positive::<usize>("-3").is_err());
        assert!(positive::<usize>("abc").is_err());
        assert!(positive::<i32>("-1").is_err());
        assert_eq!(positive::<usize>("12"), Ok(12));
        assert_eq!(positive::<i32>(" 7 "), Ok(7));
    }

    #[test]
    fn help_flags_are_parsed_instead_of_builtin_help() {
        for flag in ["-h", "-?", "--help"] {
            let cli = Cli::try_parse_from(["kmeans", flag]).unwrap();
            assert!(cli.help, "{}", flag);
        }
        let cli = Cli::try_parse_from(["kmeans"]).unwrap();
        assert!(!cli.help);
    }

    #[test]
    fn defaults_and_short_flags() {
        let config = Cli::try_parse_from(["kmeans", "-d", "2", "-c", "5", "-p", "40", "-s", "9", "-t", "3"])
            .unwrap()
            .into_config();
        assert_eq!((config.dim, config.clusters, config.points, config.grid_size, config.threads), (2, 5, 40, 9, 3));

        let config = Cli::try_parse_from(["kmeans"]).unwrap().into_config();
        assert_eq!(config.dim, DEFAULT_DIM);
        assert_eq!(config.points, DEFAULT_POINTS);
    }

    #[test]
    fn non_positive_flags_fail_to_parse() {
        for args in [["kmeans", "-d", "0"], ["kmeans", "-t", "-2"], ["kmeans", "-p", "x"], ["kmeans", "--chunk", "0"]] {
            assert!(Cli::try_parse_from(args).is_err(), "{:?}", args);
        }
    }

    #[test]
    fn huge_dynamic_chunk_is_accepted() {
        let config = Cli::try_parse_from(["kmeans", "--schedule", "dynamic", "--chunk", "9223372036854775808"])
            .unwrap()
            .into_config();
        assert_eq!(config.schedule, Schedule::Dynamic { chunk: 1 << 63 });
        assert!(config.validate().is_ok());
    }
}
