//! Interactive device chooser reading indices from a terminal.

use std::io::{self, BufRead, Write};

use raylab_gpu::{DeviceChooser, DeviceSummary, NegotiationReport, SelectionError};

/// Lists the devices once, then prompts for an index on every call.
pub struct ConsoleChooser<R, W> {
    input: R,
    output: W,
    listed: bool,
}

impl ConsoleChooser<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleChooser<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            listed: false,
        }
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.output
    }

    fn list(
        &mut self,
        devices: &[DeviceSummary],
        diagnostics: &NegotiationReport,
    ) -> io::Result<()> {
        let missing: Vec<String> = diagnostics
            .missing()
            .map(|e| e.requirement.display_name())
            .collect();
        if !missing.is_empty() {
            writeln!(
                self.output,
                "Unavailable optional {} capabilities: {}",
                diagnostics.scope,
                missing.join(", ")
            )?;
            writeln!(self.output)?;
        }

        for device in devices {
            writeln!(
                self.output,
                "[{}]=======[Physical Device] : {}=======",
                device.index, device.name
            )?;
            writeln!(
                self.output,
                "Type : {:?} ({:?})",
                device.device_type, device.vendor
            )?;
            writeln!(self.output, "Driver Version : {}", device.driver_version)?;
            writeln!(self.output, "API Version : {}", device.api_version)?;
            writeln!(self.output)?;
        }
        Ok(())
    }

    fn prompt(&mut self, count: usize) -> io::Result<Option<String>> {
        write!(
            self.output,
            "Select Physical Device Index [0 - {}] : ",
            count.saturating_sub(1)
        )?;
        self.output.flush()?;

        // Undecodable bytes are a non-numeric entry, not end of input
        let mut line = Vec::new();
        if self.input.read_until(b'\n', &mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&line).trim().to_string()))
    }
}

impl<R: BufRead, W: Write> DeviceChooser for ConsoleChooser<R, W> {
    fn choose(
        &mut self,
        devices: &[DeviceSummary],
        diagnostics: &NegotiationReport,
    ) -> Option<String> {
        if !self.listed {
            self.listed = true;
            if let Err(e) = self.list(devices, diagnostics) {
                tracing::warn!("Failed to list devices: {e}");
            }
        }

        match self.prompt(devices.len()) {
            Ok(input) => input,
            Err(e) => {
                tracing::error!("Failed to read device selection: {e}");
                None
            }
        }
    }

    fn rejected(&mut self, _input: &str, error: &SelectionError) {
        let _ = writeln!(self.output, "Selected wrong index, {error}");
    }
}
