mod diagnostics;
mod discovery;
mod logging;
