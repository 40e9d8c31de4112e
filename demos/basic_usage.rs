use fb_status::config::{self, BoundaryConfig};
use fb_status::{
    Boundary, Crossing, ENGINE_MESSAGES, LocalStatus, RawStatus, Result, StatusArgs,
    StatusInterface, SystemError, check_status, gds, journal, markers::*,
};

/// Stand-in for a native attach call that fails after a network error.
fn attach(database: &str) -> Result<u32> {
    let strings = ["db.example.org"];
    let words = [
        ARG_GDS,
        gds::NETWORK_ERROR.raw(),
        ARG_STRING,
        0,
        ARG_GDS,
        gds::NET_READ_ERR.raw(),
        ARG_END,
    ];
    check_status(RawStatus::new(&words, &strings))?;
    println!("attached to {database}");
    Ok(1)
}

fn open_log(path: &str) -> Result<()> {
    if path.starts_with("/missing") {
        return SystemError::raise("open", 2);
    }
    Ok(())
}

fn main() {
    // Optional: install a catalog so codes render with engine texts.
    if let Err(err) = config::init(BoundaryConfig::new().with_catalog(&ENGINE_MESSAGES)) {
        eprintln!("config: {err}");
    }

    println!("--- Basic Usage Example ---\n");

    let boundary = Boundary::new();
    let mut status = LocalStatus::new();

    // SCENARIO 1: A status vector coming back from the native library.
    match boundary.call(&mut status, |_| attach("employee.fdb")) {
        Crossing::Completed(handle) => println!("handle {handle}"),
        Crossing::Failed(description) | Crossing::Cancelled(description) => {
            println!("1. [HOST VIEW] attach failed");
            println!("   primary:   {}", description.primary_code);
            println!("   secondary: {:?}", description.secondary_codes);
            println!("   message:   {}", description.message);
        }
    }
    println!("   status words: {:?}\n", status.errors().words());

    // SCENARIO 2: An OS failure raised by native code.
    let crossing = boundary.call(&mut status, |_| open_log("/missing/firebird.log"));
    if let Some(description) = crossing.description() {
        println!("2. [HOST VIEW] open failed");
        println!("   os error:  {:?}", description.os_error);
        println!("   message:   {}\n", description.message);
    }

    // SCENARIO 3: Cancellation observed at a checkpoint.
    boundary.token().cancel();
    let crossing = boundary.call(&mut status, |checkpoint| {
        for page in 0..1_000u32 {
            checkpoint.check()?;
            std::hint::black_box(page);
        }
        Ok(())
    });
    println!("3. [HOST VIEW] cancelled: {}", crossing.is_cancelled());
    boundary.token().reset();

    // SCENARIO 4: Building a vector by hand and converting it back.
    let err = StatusArgs::error(gds::IO_ERROR)
        .static_str("read")
        .str("/var/lib/firebird/employee.fdb")
        .native_os(5)
        .raise::<()>()
        .unwrap_err();
    println!("\n4. [RECORD] {err}");
    err.with_diagnostic_log(|log| println!("   [LOG] {log}"));

    // SCENARIO 5: Panics never cross; they are journaled as fatal errors.
    let _ = boundary.call(&mut status, |_| -> Result<()> { panic!("driver state lost") });
    for entry in journal::global().get_recent(5) {
        println!("\n5. [JOURNAL] {} code={:?} '{}'", entry.kind, entry.primary_code, entry.message);
    }
}
