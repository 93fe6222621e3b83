use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info, warn};
use serde_json::json;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use eventscript_core::script::FUNCTIONS_PER_OBJECT;
use eventscript_core::{assemble, Command, Platform, Script};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Debug, Parser)]
#[command(name = "eventscript", version, about = "Inspect and edit Chrono Trigger event scripts")]
struct Args {
    /// Log structural edits (same as RUST_LOG=debug).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PlatformArg {
    Snes,
    Pc,
}

impl From<PlatformArg> for Platform {
    fn from(p: PlatformArg) -> Self {
        match p {
            PlatformArg::Snes => Platform::Snes,
            PlatformArg::Pc => Platform::Pc,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Print the pointer table and a disassembly of a decompressed script.
    Dump {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = PlatformArg::Snes)]
        platform: PlatformArg,
        #[arg(long)]
        json: bool,
    },
    /// Decode every `.bin` script under a directory, re-encode each command and
    /// check that an insert/delete pair leaves the script unchanged.
    Check {
        dir: PathBuf,
        #[arg(long, value_enum, default_value_t = PlatformArg::Snes)]
        platform: PlatformArg,
    },
    /// Replace one function's body with assembled text.
    SetFunction {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        object: usize,
        #[arg(long)]
        function: usize,
        #[arg(long, value_name = "FILE")]
        asm: PathBuf,
        #[arg(long, value_enum, default_value_t = PlatformArg::Snes)]
        platform: PlatformArg,
    },
    /// Remove an object and renumber references to the objects after it.
    RemoveObject {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        object: usize,
        #[arg(long, value_enum, default_value_t = PlatformArg::Snes)]
        platform: PlatformArg,
    },
    /// Convert a Temporal Flux export into a raw script.
    ImportFlux {
        input: PathBuf,
        output: PathBuf,
        /// Also write the imported strings as a JSON array.
        #[arg(long, value_name = "FILE")]
        strings: Option<PathBuf>,
    },
}

fn load(path: &Path, platform: PlatformArg) -> CliResult<Script> {
    let bytes = std::fs::read(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    Ok(Script::from_bytes(&bytes, platform.into())?)
}

fn store(path: &Path, script: &Script) -> CliResult<()> {
    std::fs::write(path, script.to_bytes())
        .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
    info!("wrote {} ({} bytes)", path.display(), script.len() + 1);
    Ok(())
}

fn dump(file: &Path, platform: PlatformArg, as_json: bool) -> CliResult<()> {
    let script = load(file, platform)?;

    let mut objects = Vec::with_capacity(script.num_objects());
    for obj in 0..script.num_objects() {
        let mut functions = Vec::with_capacity(FUNCTIONS_PER_OBJECT);
        for func in 0..FUNCTIONS_PER_OBJECT {
            functions.push(json!({
                "start": script.function_start(obj, func)?,
                "end": script.function_end(obj, func)?,
                "linked": script.is_function_linked(obj, func)?,
                "empty": script.is_function_empty(obj, func)?,
            }));
        }
        objects.push(functions);
    }

    let area = script.command_area();
    let mut commands = Vec::new();
    for item in script.commands(area.start, area.end) {
        commands.push(item?);
    }

    if as_json {
        let listing: Vec<_> = commands
            .iter()
            .map(|(pos, cmd)| json!({ "pos": pos, "command": cmd, "text": cmd.to_string() }))
            .collect();
        let out = json!({
            "num_objects": script.num_objects(),
            "objects": objects,
            "commands": listing,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for (obj, functions) in objects.iter().enumerate() {
        print!("obj {obj:02X}:");
        for f in functions {
            let tag = if f["linked"] == true {
                "L"
            } else if f["empty"] == true {
                "-"
            } else {
                " "
            };
            print!(" {:04X}{tag}", f["start"].as_u64().unwrap_or_default());
        }
        println!();
    }
    println!();
    for (pos, cmd) in &commands {
        println!("{pos:04X}  {cmd}");
    }
    Ok(())
}

fn check_one(path: &Path, platform: PlatformArg) -> CliResult<usize> {
    let bytes = std::fs::read(path)?;
    let script = Script::from_bytes(&bytes, platform.into())?;
    let area = script.command_area();

    let mut count = 0;
    for item in script.commands(area.start, area.end) {
        let (pos, cmd) = item?;
        let encoded = cmd.encode();
        if script.data().get(pos..pos + encoded.len()) != Some(&encoded[..]) {
            return Err(format!("command at {pos:#06X} ({cmd}) does not re-encode to its bytes").into());
        }
        count += 1;
    }

    // An insert followed by its delete must restore every pointer and jump.
    let mut edited = script.clone();
    edited.insert_command(&Command::end_cmd(), area.start)?;
    edited.delete_commands(area.start, 1)?;
    if edited.to_bytes() != bytes {
        return Err("inserting and deleting a command does not restore the script".into());
    }
    Ok(count)
}

fn check(dir: &Path, platform: PlatformArg) -> CliResult<()> {
    let mut checked = 0;
    let mut failed = 0;
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().map_or(true, |e| e != "bin") {
            continue;
        }
        checked += 1;
        match check_one(path, platform) {
            Ok(count) => debug!("{}: {count} commands", path.display()),
            Err(e) => {
                failed += 1;
                warn!("{}: {e}", path.display());
                println!("FAIL {}: {e}", path.display());
            }
        }
    }

    println!("{checked} scripts checked, {failed} failed");
    if failed > 0 {
        return Err(format!("{failed} of {checked} scripts failed").into());
    }
    Ok(())
}

fn ascii_text(text: &[u8]) -> Vec<u8> {
    let mut out = text.to_vec();
    out.push(0);
    out
}

fn run(args: Args) -> CliResult<()> {
    match args.command {
        Cmd::Dump { file, platform, json } => dump(&file, platform, json),
        Cmd::Check { dir, platform } => check(&dir, platform),
        Cmd::SetFunction {
            input,
            output,
            object,
            function,
            asm,
            platform,
        } => {
            let mut script = load(&input, platform)?;
            let src = std::fs::read_to_string(&asm)
                .map_err(|e| format!("failed to read {}: {e}", asm.display()))?;
            let body = assemble(&src, platform.into())?;
            script.set_function(object, function, &body)?;
            store(&output, &script)
        }
        Cmd::RemoveObject {
            input,
            output,
            object,
            platform,
        } => {
            let mut script = load(&input, platform)?;
            script.remove_object(object)?;
            store(&output, &script)
        }
        Cmd::ImportFlux { input, output, strings } => {
            let flux = std::fs::read(&input)
                .map_err(|e| format!("failed to read {}: {e}", input.display()))?;
            let script = Script::from_flux(&flux, ascii_text)?;
            store(&output, &script)?;
            if let Some(path) = strings {
                let text: Vec<String> = script
                    .strings()
                    .iter()
                    .map(|s| {
                        let s = s.as_slice();
                        String::from_utf8_lossy(s.strip_suffix(&[0u8]).unwrap_or(s)).into_owned()
                    })
                    .collect();
                std::fs::write(&path, serde_json::to_string_pretty(&text)?)?;
            }
            Ok(())
        }
    }
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(err) = run(args) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, bytes: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("eventscript-{}-{name}.bin", std::process::id()));
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn one_object(body: &[u8]) -> Vec<u8> {
        let mut bytes = vec![1u8];
        for _ in 0..FUNCTIONS_PER_OBJECT {
            bytes.extend_from_slice(&[0x20, 0x00]);
        }
        bytes.extend_from_slice(body);
        bytes
    }

    #[test]
    fn check_accepts_a_consistent_script() {
        let path = write_temp("good", &one_object(&[0x10, 0x01, 0x00, 0xB2]));
        let count = check_one(&path, PlatformArg::Snes).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn check_rejects_a_truncated_command() {
        let path = write_temp("truncated", &one_object(&[0xB2, 0x4B, 0x01]));
        let result = check_one(&path, PlatformArg::Snes);
        std::fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }
}
