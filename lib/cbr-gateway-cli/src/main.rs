#![allow(missing_docs, clippy::print_stdout, clippy::print_stderr)]
use std::ffi::OsString;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use cbr_gateway_core::{
    CURRENCY_CODE_FIELD, CallArguments, DateInput, Gateway, NOMINAL_FIELD, RATE_FIELD,
};
use chrono::FixedOffset;
use serde_json::Value;
use tracing::{Level, error};

const HELP: &str = "\
cbr-gateway: query the Central Bank of Russia web services

USAGE:
  cbr-gateway [OPTIONS] <COMMAND>

COMMANDS:
  course <CODE>                        Rate of one unit of a currency
  courses                              All currency rates
  call <SCHEMA> <METHOD> [ARGS...]     Call any method, ARGS as name=value or positional values
  describe <SCHEMA> <METHOD>           Signature of a method
  methods <SCHEMA>                     Methods of a schema

SCHEMAS:
  daily, regions, organizations, market

OPTIONS:
  --date <DATE>       Date of the rates (DD.MM.YYYY, YYYY-MM-DD or a Unix timestamp), default today
  --xml               Print the XML result of `call` instead of JSON
  --offset <HOURS>    UTC offset of the service calendar, default 3
  --timeout <SECS>    Request timeout, default 30
  -v, --verbose       Log the calls
  -h, --help          Print this help
";

#[tokio::main]
async fn main() -> ExitCode {
    let args = match AppArgs::parse() {
        Ok(Some(args)) => args,
        Ok(None) => {
            println!("{HELP}");
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("{err:#}\n\n{HELP}");
            return ExitCode::FAILURE;
        }
    };

    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: AppArgs) -> Result<()> {
    let mut builder = Gateway::builder();
    if let Some(hours) = args.offset {
        builder = builder.with_service_offset(service_offset(hours)?);
    }
    if let Some(secs) = args.timeout {
        builder = builder.with_timeout(Duration::from_secs(secs));
    }
    let gateway = builder.build().context("building the gateway")?;

    match args.command {
        Command::Course { code } => {
            match gateway.course_rate(&code, args.date).await? {
                Some(rate) => println!("{code} {rate}"),
                None => println!("{code} not found"),
            }
        }
        Command::Courses => {
            for entry in gateway.list_courses(args.date).await? {
                let field = |name| entry.child_text(name).unwrap_or_default().trim();
                println!(
                    "{} {} {}",
                    field(CURRENCY_CODE_FIELD),
                    field(NOMINAL_FIELD),
                    field(RATE_FIELD)
                );
            }
        }
        Command::Call {
            schema,
            method,
            arguments,
        } => {
            let mut dispatcher = gateway.dispatcher();
            dispatcher
                .select_schema_named(&schema)?
                .select_method(method, arguments);
            if args.xml {
                println!("{}", dispatcher.as_xml_fragment().await?);
            } else {
                let result = dispatcher.as_structured().await?;
                println!("{}", serde_json::to_string_pretty(result.value())?);
            }
        }
        Command::Describe { schema, method } => {
            let mut dispatcher = gateway.dispatcher();
            let signature = dispatcher
                .select_schema_named(&schema)?
                .select_method(method, CallArguments::new())
                .describe_method()
                .await?;
            println!("{signature}");
        }
        Command::Methods { schema } => {
            let mut dispatcher = gateway.dispatcher();
            let methods = dispatcher
                .select_schema_named(&schema)?
                .available_methods()
                .await?;
            for method in methods {
                println!("{method}");
            }
        }
    }

    Ok(())
}

#[derive(Debug)]
enum Command {
    Course {
        code: String,
    },
    Courses,
    Call {
        schema: String,
        method: String,
        arguments: CallArguments,
    },
    Describe {
        schema: String,
        method: String,
    },
    Methods {
        schema: String,
    },
}

#[derive(Debug)]
struct AppArgs {
    command: Command,
    date: Option<DateInput>,
    xml: bool,
    offset: Option<i32>,
    timeout: Option<u64>,
    verbose: bool,
}

impl AppArgs {
    fn parse() -> Result<Option<Self>> {
        let mut pargs = pico_args::Arguments::from_env();
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let verbose = pargs.contains(["-v", "--verbose"]);
        let xml = pargs.contains("--xml");
        let date = pargs
            .opt_value_from_str::<_, String>("--date")
            .context("parsing date argument")?
            .map(DateInput::from);
        let offset = pargs
            .opt_value_from_str("--offset")
            .context("parsing offset argument")?;
        let timeout = pargs
            .opt_value_from_str("--timeout")
            .context("parsing timeout argument")?;

        let Some(command) = pargs.subcommand().context("parsing command")? else {
            bail!("missing command");
        };
        let mut command = match command.as_str() {
            "course" => Command::Course {
                code: pargs.free_from_str().context("parsing currency code")?,
            },
            "courses" => Command::Courses,
            "call" => Command::Call {
                schema: pargs.free_from_str().context("parsing schema")?,
                method: pargs.free_from_str().context("parsing method")?,
                arguments: CallArguments::new(),
            },
            "describe" => Command::Describe {
                schema: pargs.free_from_str().context("parsing schema")?,
                method: pargs.free_from_str().context("parsing method")?,
            },
            "methods" => Command::Methods {
                schema: pargs.free_from_str().context("parsing schema")?,
            },
            other => bail!("unknown command '{other}'"),
        };

        let remaining = pargs.finish();
        if let Command::Call { arguments, .. } = &mut command {
            *arguments = parse_call_arguments(remaining)?;
        } else if !remaining.is_empty() {
            bail!("unexpected arguments {remaining:?}");
        }

        Ok(Some(Self {
            command,
            date,
            xml,
            offset,
            timeout,
            verbose,
        }))
    }
}

fn service_offset(hours: i32) -> Result<FixedOffset> {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .with_context(|| format!("invalid UTC offset {hours}"))
}

// `name=value` pairs are named arguments, anything else is positional.
// Values are read as JSON when possible, as text otherwise.
fn parse_call_arguments(raw: Vec<OsString>) -> Result<CallArguments> {
    let mut arguments = CallArguments::new();
    for arg in raw {
        let Some(arg) = arg.to_str() else {
            bail!("argument {arg:?} is not valid UTF-8");
        };
        arguments = match arg.split_once('=') {
            Some((name, value)) if !name.is_empty() => arguments.add_arg(name, parse_value(value)),
            _ => arguments.push_arg(parse_value(arg)),
        };
    }
    Ok(arguments)
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
