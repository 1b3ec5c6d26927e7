use crate::cli::WindowArgs;
use crate::error::{CliError, Result};
use lyao::core::calendar::CalendarTable;
use lyao::core::timing::{TimeWindow, TwilightSource, resolve_window};

pub fn run(args: WindowArgs) -> Result<()> {
    let window = resolve(&args)?;
    println!("{}", render(&window));
    Ok(())
}

fn resolve(args: &WindowArgs) -> Result<TimeWindow> {
    let table;
    let source = match (&args.twilight.calendar, args.twilight.fixed_hours.as_deref()) {
        (Some(path), _) => {
            table = CalendarTable::from_path(path)?;
            TwilightSource::Calendar(&table)
        }
        (None, Some(&[am_hour, pm_hour])) => TwilightSource::FixedHours { am_hour, pm_hour },
        _ => {
            return Err(CliError::Argument(
                "Provide either --calendar or --fixed-hours AM PM.".to_string(),
            ));
        }
    };
    Ok(resolve_window(args.date, args.utc_offset, &source)?)
}

fn render(window: &TimeWindow) -> String {
    format!(
        "AM       {}\nPM       {}\nMidnight {}",
        window.am, window.pm, window.midnight
    )
}
