use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    let version = env!("CARGO_PKG_VERSION");
    if !args.extended {
        println!("cmdwire {version}");
        return Ok(SUCCESS);
    }

    let features = [
        ("messenger", cfg!(feature = "messenger")),
        ("async", cfg!(feature = "async")),
        ("cli", cfg!(feature = "cli")),
    ]
    .iter()
    .map(|(name, on)| format!("{name}={on}"))
    .collect::<Vec<_>>()
    .join(", ");

    println!("cmdwire {version}");
    println!("  target:    {}", option_env!("CMDWIRE_BUILD_TARGET").unwrap_or("unknown"));
    println!("  os/arch:   {}/{}", std::env::consts::OS, std::env::consts::ARCH);
    println!("  features:  {features}");
    let seps = cmdwire_frame::Separators::default();
    println!(
        "  framing:   field '{}' command '{}' escape '{}'",
        seps.field as char, seps.command as char, seps.escape as char
    );

    Ok(SUCCESS)
}
