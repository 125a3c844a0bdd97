//! Ctrl-C handling for the translating commands.

use std::io;
use std::thread;

use pdftrans::CancellationToken;
use tokio::runtime::Builder;

#[cfg(unix)]
type Interrupts = tokio::signal::unix::Signal;
#[cfg(windows)]
type Interrupts = tokio::signal::windows::CtrlC;

#[cfg(unix)]
fn listen() -> io::Result<Interrupts> {
    tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
}

#[cfg(windows)]
fn listen() -> io::Result<Interrupts> {
    tokio::signal::windows::ctrl_c()
}

/// Cancel `token` on the first Ctrl-C; exit on the second.
///
/// The listener is registered before this returns, so an interrupt that
/// arrives right after never falls through to the default handler.
pub fn cancel_on_interrupt(token: CancellationToken) -> io::Result<()> {
    let runtime = Builder::new_current_thread().enable_all().build()?;
    let mut interrupts = {
        let _context = runtime.enter();
        listen()?
    };

    thread::Builder::new()
        .name("pdftrans-interrupt".to_string())
        .spawn(move || {
            runtime.block_on(async move {
                if interrupts.recv().await.is_none() {
                    return;
                }
                log::warn!("Interrupted, stopping after the pages in progress (Ctrl-C again to quit)");
                token.cancel();
                if interrupts.recv().await.is_some() {
                    std::process::exit(130);
                }
            });
        })?;
    Ok(())
}
