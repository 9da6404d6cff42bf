//! gluespec CLI - Command-line interface
//!
//! Commands:
//!   generate  - Generate glue code from definition documents
//!   languages - List supported target languages
//!   version   - Print version
//!   help      - Print usage

use gluespec::*;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let result = match args[1].as_str() {
        "generate" => cmd_generate(&args[2..]),
        "languages" => {
            for language in LANGUAGES {
                println!("{language}");
            }
            Ok(())
        }
        "version" | "--version" | "-v" => {
            println!("gluespec {}", VERSION);
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            Err("Unknown command".into())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"
gluespec - schema-driven glue-code generation

USAGE:
    gluespec <COMMAND> [OPTIONS]

COMMANDS:
    generate -l <lang> -f <functions.yaml>...   Generate glue code
    languages                                   List supported languages
    version                                     Print version
    help                                        Print this message

GENERATE OPTIONS:
    -l <language>         Target language (required; see `gluespec languages`)
    -f <functions.yaml>   Function definition document (required, repeatable;
                          later documents override earlier ones)
    -t <types.yaml>       Type definition document (repeatable, same layering)
    -i <template>         Input template; generated code replaces its
                          %%functions%% marker
    -o <file>             Output file (default: stdout, also `-`)

EXAMPLES:
    gluespec generate -l R -f functions.yaml -t types.yaml
    gluespec generate -l Python -f base.yaml -f local.yaml -t types.yaml \
        -i wrapper.py.in -o wrapper.py
"#
    );
}

fn cmd_generate(args: &[String]) -> Result<()> {
    let mut request = GenerateRequest::default();
    let mut output: Option<String> = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-l" => request.language = flag_value(&mut iter, "-l")?.clone(),
            "-f" => {
                let path = flag_value(&mut iter, "-f")?;
                request.function_docs.push(load_document(Path::new(path))?);
            }
            "-t" => {
                let path = flag_value(&mut iter, "-t")?;
                request.type_docs.push(load_document(Path::new(path))?);
            }
            "-i" => {
                let path = flag_value(&mut iter, "-i")?;
                request.template = Some(fs::read_to_string(path).map_err(Error::Io)?);
            }
            "-o" => output = Some(flag_value(&mut iter, "-o")?.clone()),
            other => return Err(Error::Other(format!("unknown option: {other}"))),
        }
    }

    if request.language.is_empty() {
        return Err("a target language is required (-l <language>)".into());
    }
    if request.function_docs.is_empty() {
        return Err("at least one function document is required (-f <file>)".into());
    }

    let code = generate::run(&request)?;

    match output.as_deref() {
        None | Some("-") => print!("{code}"),
        Some(path) => fs::write(path, code).map_err(Error::Io)?,
    }
    Ok(())
}

fn flag_value<'a>(iter: &mut std::slice::Iter<'a, String>, flag: &str) -> Result<&'a String> {
    iter.next()
        .ok_or_else(|| Error::Other(format!("missing value for {flag}")))
}
