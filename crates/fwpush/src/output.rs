// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of fwpush.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz


//! Table rendering for the command line

use crate::model::{Device, FirmwareArtifact};
use crate::orchestrator::UpgradeReport;
use crate::rollout::EligibleFirmware;
use crate::version::is_newer;
use comfy_table::{Attribute, Cell, Color, Table, presets::UTF8_FULL};

fn header(table: &mut Table, titles: &[&str]) {
    table.load_preset(UTF8_FULL);
    table.set_header(
        titles
            .iter()
            .map(|t| Cell::new(t).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
}

#[derive(Debug)]
pub struct TableFormatter;

impl TableFormatter {
    pub fn firmware(firmware: &[EligibleFirmware]) -> String {
        if firmware.is_empty() {
            return "No firmware available\n".to_string();
        }

        let mut table = Table::new();
        header(&mut table, &["Agent type", "Version", "Latest", "Rollout", "Firmware id"]);

        for entry in firmware {
            let rollout = match (entry.status.allowed, entry.status.days_remaining) {
                (true, _) => Cell::new("allowed").fg(Color::Green),
                (false, Some(days)) => Cell::new(format!("hold, {days} days left")).fg(Color::Yellow),
                (false, None) => Cell::new("hold").fg(Color::Yellow),
            };
            table.add_row(vec![
                Cell::new(&entry.artifact.agent_type_name),
                Cell::new(&entry.artifact.version),
                Cell::new(if entry.artifact.latest { "yes" } else { "" }),
                rollout,
                Cell::new(&entry.artifact.public_id),
            ]);
        }

        format!("{table}\n")
    }

    pub fn devices(devices: &[Device]) -> String {
        if devices.is_empty() {
            return "No devices\n".to_string();
        }

        let mut table = Table::new();
        header(&mut table, &["Name", "Serial", "Firmware", "Device id"]);

        for device in devices {
            table.add_row(vec![
                Cell::new(&device.name),
                Cell::new(device.serial_number.as_deref().unwrap_or("-")),
                Cell::new(device.firmware_version().unwrap_or("unknown")),
                Cell::new(&device.public_id),
            ]);
        }

        format!("{table}\n{} devices\n", devices.len())
    }

    /// Devices selected for `target`, marking which ones would move backwards.
    pub fn candidates(target: &FirmwareArtifact, devices: &[Device]) -> String {
        if devices.is_empty() {
            return format!("No devices to upgrade to {}\n", target.version);
        }

        let mut table = Table::new();
        header(&mut table, &["Name", "Device id", "Current", "Target", "Change"]);

        for device in devices {
            let current = device.firmware_version();
            let change = match current {
                Some(v) if is_newer(&target.version, v) => Cell::new("downgrade").fg(Color::Red),
                Some(_) => Cell::new("upgrade"),
                None => Cell::new("install"),
            };
            table.add_row(vec![
                Cell::new(&device.name),
                Cell::new(&device.public_id),
                Cell::new(current.unwrap_or("unknown")),
                Cell::new(&target.version),
                change,
            ]);
        }

        format!("{table}\n")
    }

    pub fn report(report: &UpgradeReport) -> String {
        let mut output = format!(
            "Upgrade to {} ({}): {} of {} dispatched\n",
            report.version,
            report.firmware_id,
            report.dispatched.len(),
            report.attempted()
        );

        if !report.failed.is_empty() {
            let mut table = Table::new();
            header(&mut table, &["Device", "Device id", "Error"]);
            for failure in &report.failed {
                table.add_row(vec![
                    Cell::new(&failure.device_name).fg(Color::Red),
                    Cell::new(&failure.device_id),
                    Cell::new(&failure.error),
                ]);
            }
            output.push_str(&table.to_string());
            output.push('\n');
        }

        output
    }
}
