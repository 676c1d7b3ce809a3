// next_problem 命令行入口
// 从本地题库挑出下一批该刷的题

use clap::{App, Arg};
use log::error;
use std::process;

use neetcode::services::{pick_next, PickerOptions, QuestionStore};

fn setup_logger(verbose: bool) -> Result<(), fern::InitError> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

fn run(matches: &clap::ArgMatches) -> neetcode::Result<()> {
    let count: usize = matches
        .value_of("count")
        .unwrap_or("5")
        .parse()
        .map_err(|_| neetcode::Error::Config("--count must be a positive integer".to_string()))?;
    let exclude: Vec<u32> = matches
        .values_of("exclude")
        .map(|values| {
            values
                .map(|v| {
                    v.parse().map_err(|_| {
                        neetcode::Error::Config(format!("invalid problem id {:?}", v))
                    })
                })
                .collect::<neetcode::Result<_>>()
        })
        .transpose()?
        .unwrap_or_default();

    let options = PickerOptions {
        count,
        include_paid: matches.is_present("include-paid"),
        exclude_neetcode: matches.is_present("exclude-neetcode"),
        exclude,
    };

    let store = QuestionStore::open_default()?;
    let picks = pick_next(&store, &options)?;

    if matches.is_present("json") {
        println!(
            "{}",
            serde_json::to_string_pretty(&picks)
                .map_err(|e| neetcode::Error::Config(e.to_string()))?
        );
    } else if matches.is_present("first") {
        if let Some(first) = picks.first() {
            println!("{}", first.title_slug);
        }
    } else {
        for pick in &picks {
            println!(
                "{:>5}  {:<6}  {:>6.2}%  {}",
                pick.frontend_id,
                pick.difficulty,
                pick.acceptance_rate,
                pick.title
            );
        }
    }
    Ok(())
}

fn main() {
    let matches = App::new("next_problem")
        .about("按通过率从本地题库挑出下一批练习题")
        .arg(
            Arg::new("count")
                .long("count")
                .short('n')
                .takes_value(true)
                .default_value("5")
                .help("输出题目数量"),
        )
        .arg(
            Arg::new("first")
                .long("first")
                .help("只输出第一题的 slug，方便脚本接续"),
        )
        .arg(Arg::new("json").long("json").help("以 JSON 输出"))
        .arg(
            Arg::new("include-paid")
                .long("include-paid")
                .help("把付费题也纳入候选"),
        )
        .arg(
            Arg::new("exclude-neetcode")
                .long("exclude-neetcode")
                .help("排除 NeetCode 清单里已刷过的题"),
        )
        .arg(
            Arg::new("exclude")
                .long("exclude")
                .takes_value(true)
                .multiple_values(true)
                .use_value_delimiter(true)
                .help("额外排除的题号，逗号分隔"),
        )
        .arg(Arg::new("verbose").long("verbose").short('v').help("打印调试日志"))
        .get_matches();

    if let Err(e) = setup_logger(matches.is_present("verbose")) {
        eprintln!("logger init failed: {}", e);
    }

    if let Err(e) = run(&matches) {
        error!("{}", e);
        process::exit(1);
    }
}
