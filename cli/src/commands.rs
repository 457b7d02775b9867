use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use strum::IntoEnumIterator;
use taskr_permissions::Permission;
use taskr_permissions::PermissionDomain;
use taskr_permissions::PermissionModel;
use taskr_permissions::Role;
use taskr_permissions::RolePermissionTable;
use tracing::debug;

use crate::cli_args::Command;
use crate::cli_args::TaskrCli;

/// Result of a command: decisions report `Denied` so the binary can exit
/// non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Allowed,
    Denied,
}

impl Outcome {
    fn from_decision(allowed: bool) -> Self {
        if allowed { Outcome::Allowed } else { Outcome::Denied }
    }

    fn label(self) -> &'static str {
        match self {
            Outcome::Allowed => "allowed",
            Outcome::Denied => "denied",
            Outcome::Done => "done",
        }
    }
}

/// Build the model from `--table` when given, otherwise the built-in table.
pub fn load_model(table: Option<&Path>) -> anyhow::Result<PermissionModel> {
    let table = match table {
        Some(path) => RolePermissionTable::load(path)
            .with_context(|| format!("failed to load permission table {}", path.display()))?,
        None => {
            debug!("using built-in permission table");
            RolePermissionTable::builtin()
        }
    };
    Ok(PermissionModel::new(Arc::new(table)))
}

pub fn run(cli: &TaskrCli, out: &mut impl Write) -> anyhow::Result<Outcome> {
    let model = || load_model(cli.table.as_deref());
    match &cli.command {
        Command::Matrix { json } => {
            let model = model()?;
            if *json {
                let config = model.table().to_config();
                writeln!(out, "{}", serde_json::to_string_pretty(&config)?)?;
            } else {
                write_matrix(&model, out)?;
            }
            Ok(Outcome::Done)
        }
        Command::Check { role, permission } => {
            decide(out, model()?.has_permission_by_name(role, permission))
        }
        Command::CanManage { manager, target } => {
            decide(out, model()?.can_manage_user_by_name(manager, target))
        }
        Command::CanChangeRole {
            current,
            new_role,
            changer,
        } => decide(
            out,
            model()?.can_change_role_by_name(current, new_role, changer),
        ),
        Command::Snapshot { role } => match model()?.snapshot_by_name(role) {
            Some(snapshot) => {
                writeln!(out, "{}", snapshot.to_json()?)?;
                Ok(Outcome::Done)
            }
            None => decide(out, false),
        },
        Command::Validate { file } => validate(file, out),
    }
}

fn decide(out: &mut impl Write, allowed: bool) -> anyhow::Result<Outcome> {
    let outcome = Outcome::from_decision(allowed);
    writeln!(out, "{}", outcome.label())?;
    Ok(outcome)
}

fn validate(file: &Path, out: &mut impl Write) -> anyhow::Result<Outcome> {
    let table = RolePermissionTable::load(file)
        .with_context(|| format!("invalid permission table {}", file.display()))?;
    writeln!(
        out,
        "ok: {} roles, {} grants",
        table.roles().count(),
        table
            .roles()
            .map(|r| table.permissions_for(r).len())
            .sum::<usize>()
    )?;
    Ok(Outcome::Done)
}

fn write_matrix(model: &PermissionModel, out: &mut impl Write) -> std::io::Result<()> {
    let width = Permission::iter()
        .map(|p| p.as_str().len())
        .max()
        .unwrap_or_default();
    write!(out, "{:width$}", "")?;
    for role in Role::iter() {
        write!(out, "  {:>6}", role.as_str())?;
    }
    writeln!(out)?;

    for domain in PermissionDomain::iter() {
        writeln!(out, "[{domain}]")?;
        for permission in Permission::in_domain(domain) {
            write!(out, "{:width$}", permission.as_str())?;
            for role in Role::iter() {
                let mark = if model.has_permission(role, permission) { "x" } else { "-" };
                write!(out, "  {mark:>6}")?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}
