use std::io::{self, BufRead, Write};

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use seat_booking::{
    config::{AppConfig, Config, LogFormat},
    error::ReservationError,
    models::{Event, Reservation, SeatStatus},
    services::{LogOutcome, ReservationService},
    AppState,
};

const CANCEL_COMMAND: &str = "/cancel";

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    init_tracing(&config.app);

    info!("Starting Ticket Reservation System ({})", config.app.environment);

    let mut state = AppState::new(config);
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();

    run(&mut state.service, &mut input, &mut out)
}

fn init_tracing(app: &AppConfig) {
    // Logs go to stderr so they never interleave with the prompts on stdout
    let registry = tracing_subscriber::registry().with(EnvFilter::new(&app.rust_log));
    match app.log_format {
        LogFormat::Text => registry.with(fmt::layer().with_writer(io::stderr)).init(),
        LogFormat::Json => registry.with(fmt::layer().json().with_writer(io::stderr)).init(),
    }
}

enum Step {
    Home,
    Booking(Event, Reservation),
    Confirmation(Event, Reservation),
    Quit,
}

fn run<R: BufRead, W: Write>(
    service: &mut ReservationService,
    input: &mut R,
    out: &mut W,
) -> anyhow::Result<()> {
    let mut step = Step::Home;
    loop {
        step = match step {
            Step::Home => home(service, input, out)?,
            Step::Booking(event, reservation) => booking(service, event, reservation, input, out)?,
            Step::Confirmation(event, reservation) => {
                confirmation(service, event, reservation, input, out)?
            }
            Step::Quit => return Ok(()),
        };
    }
}

fn home<R: BufRead, W: Write>(
    service: &mut ReservationService,
    input: &mut R,
    out: &mut W,
) -> anyhow::Result<Step> {
    service.cancel();
    writeln!(out, "\nWelcome to Ticket Reservation System")?;

    let events = match service.list_events() {
        Ok(events) => events,
        Err(err) if err.is_fatal() => {
            return Err(err).context("cannot start without event data");
        }
        Err(err) => {
            show_error(out, &err)?;
            return retry_or_quit(input, out);
        }
    };

    for (idx, event) in events.iter().enumerate() {
        writeln!(out, "  {}. {}", idx + 1, event.name)?;
    }

    let Some(answer) = prompt(input, out, "Select event number (q to quit): ")? else {
        return Ok(Step::Quit);
    };
    if answer.eq_ignore_ascii_case("q") {
        return Ok(Step::Quit);
    }

    let chosen = answer
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|idx| events.get(idx));
    match chosen {
        Some(event) => {
            let reservation = service.select_event(event);
            Ok(Step::Booking(event.clone(), reservation))
        }
        None => {
            writeln!(out, "Please select an event to continue!")?;
            Ok(Step::Home)
        }
    }
}

fn booking<R: BufRead, W: Write>(
    service: &mut ReservationService,
    event: Event,
    reservation: Reservation,
    input: &mut R,
    out: &mut W,
) -> anyhow::Result<Step> {
    writeln!(out, "\nSelect Seats and Confirm Booking: {}", event.name)?;
    writeln!(out, "{}", event.reserved_seats_label())?;
    for row in service.layout().seat_map(&event) {
        let cells: Vec<String> = row
            .iter()
            .map(|(seat, status)| match status {
                SeatStatus::Available => format!("{:>6}", seat),
                SeatStatus::Reserved => format!("{:>6}", "x"),
            })
            .collect();
        writeln!(out, "{}", cells.join(" "))?;
    }

    let Some(seat) = prompt(input, out, "Seat (b to go back): ")? else {
        return Ok(Step::Quit);
    };
    if seat.eq_ignore_ascii_case("b") {
        return Ok(Step::Home);
    }

    match service.select_seat(&event, &reservation, &seat) {
        Ok(updated) => Ok(Step::Confirmation(event, updated)),
        Err(err) => {
            show_error(out, &err)?;
            Ok(Step::Booking(event, reservation))
        }
    }
}

fn confirmation<R: BufRead, W: Write>(
    service: &mut ReservationService,
    event: Event,
    reservation: Reservation,
    input: &mut R,
    out: &mut W,
) -> anyhow::Result<Step> {
    writeln!(out, "\nReservation Details")?;
    for (label, value) in reservation.details() {
        writeln!(out, "  {:<15} {}", label, value)?;
    }

    let prompt_text = format!("Name (or {} to go back home): ", CANCEL_COMMAND);
    let Some(name) = prompt(input, out, &prompt_text)? else {
        return Ok(Step::Quit);
    };
    if name == CANCEL_COMMAND {
        return Ok(Step::Home);
    }

    match service.confirm(&reservation, &name) {
        Ok(result) => {
            writeln!(out, "\nBooking Confirmed")?;
            for (label, value) in result.reservation.details() {
                writeln!(out, "  {:<15} {}", label, value)?;
            }
            info!("Booked: {}", result.reservation);
            if let LogOutcome::Failed { reason } = &result.log_outcome {
                warn!("Reservation saved without audit entry: {}", reason);
                writeln!(out, "Note: the booking is saved but could not be logged ({})", reason)?;
            }
            Ok(Step::Home)
        }
        Err(err @ ReservationError::Validation(_)) => {
            show_error(out, &err)?;
            Ok(Step::Confirmation(event, reservation))
        }
        Err(err @ ReservationError::SeatUnavailable { .. }) => {
            show_error(out, &err)?;
            // Somebody else took the seat: show the current map again.
            match service.find_event(&event.name) {
                Ok(fresh) => {
                    let reservation = service.select_event(&fresh);
                    Ok(Step::Booking(fresh, reservation))
                }
                Err(err) => {
                    show_error(out, &err)?;
                    Ok(Step::Home)
                }
            }
        }
        Err(err) => {
            show_error(out, &err)?;
            Ok(Step::Home)
        }
    }
}

fn retry_or_quit<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> anyhow::Result<Step> {
    match prompt(input, out, "Press Enter to retry, q to quit: ")? {
        Some(answer) if !answer.eq_ignore_ascii_case("q") => Ok(Step::Home),
        _ => Ok(Step::Quit),
    }
}

fn show_error<W: Write>(out: &mut W, err: &ReservationError) -> io::Result<()> {
    writeln!(out, "Error: {}", err)
}

/// Prints `text` and reads one trimmed line. `None` on end of input.
fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, text: &str) -> io::Result<Option<String>> {
    write!(out, "{}", text)?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
