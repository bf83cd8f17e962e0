//! Command-line front end: each command maps to one screen or action.

use crate::error::AppError;
use crate::forms::{ActivityForm, LoginForm, RegisterForm, SubtaskForm};
use crate::models::SubtaskStatus;
use crate::pages::edit::ActivityEdits;

pub const USAGE: &str = "\
Uso: actividades <comando> [opciones]

Comandos:
  login <usuario> <contraseña>
  register <usuario> <email> <contraseña> <confirmación>
  logout
  hoy
  list
  show <id>
  create --titulo <t> --curso <c> [--tipo <k>] [--descripcion <d>]
         [--evento <fecha-hora>] [--limite <fecha>]
         [--subtarea \"nombre|fecha|horas\"]...
  edit <id> [--titulo ..] [--tipo ..] [--curso ..] [--descripcion ..]
            [--evento ..] [--limite ..]
  delete <id> [--yes]
  subtask add <actividad> --nombre <n> --fecha <f> --horas <h>
  subtask toggle <actividad> <subtarea>
  subtask status <actividad> <subtarea> <pending|done|postponed>
  subtask delete <actividad> <subtarea> [--yes]
  help";

#[derive(Debug, Clone)]
pub enum Command {
    Login(LoginForm),
    Register(RegisterForm),
    Logout,
    Today,
    List,
    Show(i64),
    Create {
        activity: ActivityForm,
        subtasks: Vec<SubtaskForm>,
    },
    Edit {
        id: i64,
        edits: ActivityEdits,
    },
    Delete {
        id: i64,
        confirmed: bool,
    },
    AddSubtask {
        activity_id: i64,
        form: SubtaskForm,
    },
    ToggleSubtask {
        activity_id: i64,
        subtask_id: i64,
    },
    SetSubtaskStatus {
        activity_id: i64,
        subtask_id: i64,
        status: SubtaskStatus,
    },
    DeleteSubtask {
        activity_id: i64,
        subtask_id: i64,
        confirmed: bool,
    },
    Help,
}

/// Parses the arguments after the program name.
pub fn parse(args: &[String]) -> Result<Command, AppError> {
    let Some((name, rest)) = args.split_first() else {
        return Ok(Command::Help);
    };

    match name.as_str() {
        "login" => {
            let [username, password] = positional::<2>(rest, "login")?;
            Ok(Command::Login(LoginForm { username, password }))
        }
        "register" => {
            let [username, email, password, confirm_password] = positional::<4>(rest, "register")?;
            Ok(Command::Register(RegisterForm {
                username,
                email,
                password,
                confirm_password,
            }))
        }
        "logout" => Ok(Command::Logout),
        "hoy" | "today" => Ok(Command::Today),
        "list" => Ok(Command::List),
        "show" => {
            let [id] = positional::<1>(rest, "show")?;
            Ok(Command::Show(parse_id(&id)?))
        }
        "create" => parse_create(rest),
        "edit" => parse_edit(rest),
        "delete" => {
            let (args, confirmed) = take_yes(rest);
            let [id] = positional::<1>(&args, "delete")?;
            Ok(Command::Delete {
                id: parse_id(&id)?,
                confirmed,
            })
        }
        "subtask" => parse_subtask(rest),
        "help" | "--help" | "-h" => Ok(Command::Help),
        other => Err(usage_error(&format!("Comando desconocido: {}", other))),
    }
}

fn parse_create(args: &[String]) -> Result<Command, AppError> {
    let mut activity = ActivityForm::default();
    let mut subtasks = Vec::new();

    for (flag, value) in flags(args)? {
        match flag {
            "--subtarea" => subtasks.push(parse_subtask_arg(&value)?),
            _ => set_activity_field(&mut activity, flag, value)?,
        }
    }
    Ok(Command::Create { activity, subtasks })
}

fn parse_edit(args: &[String]) -> Result<Command, AppError> {
    let Some((id, rest)) = args.split_first() else {
        return Err(usage_error("Falta el id de la actividad."));
    };
    let mut edits = ActivityEdits::default();
    for (flag, value) in flags(rest)? {
        let slot = match flag {
            "--titulo" => &mut edits.titulo,
            "--tipo" => &mut edits.tipo,
            "--curso" => &mut edits.curso,
            "--descripcion" => &mut edits.descripcion,
            "--evento" => &mut edits.fecha_evento,
            "--limite" => &mut edits.fecha_limite,
            other => return Err(usage_error(&format!("Opción desconocida: {}", other))),
        };
        *slot = Some(value);
    }
    Ok(Command::Edit {
        id: parse_id(id)?,
        edits,
    })
}

fn parse_subtask(args: &[String]) -> Result<Command, AppError> {
    let Some((action, rest)) = args.split_first() else {
        return Err(usage_error("Falta la acción de subtarea."));
    };

    match action.as_str() {
        "add" => {
            let Some((activity_id, rest)) = rest.split_first() else {
                return Err(usage_error("Falta el id de la actividad."));
            };
            let mut form = SubtaskForm::default();
            for (flag, value) in flags(rest)? {
                match flag {
                    "--nombre" => form.nombre = value,
                    "--fecha" => form.fecha_objetivo = value,
                    "--horas" => form.horas_estimadas = value,
                    other => return Err(usage_error(&format!("Opción desconocida: {}", other))),
                }
            }
            Ok(Command::AddSubtask {
                activity_id: parse_id(activity_id)?,
                form,
            })
        }
        "toggle" => {
            let [activity_id, subtask_id] = positional::<2>(rest, "subtask toggle")?;
            Ok(Command::ToggleSubtask {
                activity_id: parse_id(&activity_id)?,
                subtask_id: parse_id(&subtask_id)?,
            })
        }
        "status" => {
            let [activity_id, subtask_id, status] = positional::<3>(rest, "subtask status")?;
            let status = status
                .parse::<SubtaskStatus>()
                .map_err(|_| usage_error(&format!("Estado desconocido: {}", status)))?;
            Ok(Command::SetSubtaskStatus {
                activity_id: parse_id(&activity_id)?,
                subtask_id: parse_id(&subtask_id)?,
                status,
            })
        }
        "delete" => {
            let (args, confirmed) = take_yes(rest);
            let [activity_id, subtask_id] = positional::<2>(&args, "subtask delete")?;
            Ok(Command::DeleteSubtask {
                activity_id: parse_id(&activity_id)?,
                subtask_id: parse_id(&subtask_id)?,
                confirmed,
            })
        }
        other => Err(usage_error(&format!("Acción de subtarea desconocida: {}", other))),
    }
}

fn set_activity_field(form: &mut ActivityForm, flag: &str, value: String) -> Result<(), AppError> {
    let slot = match flag {
        "--titulo" => &mut form.titulo,
        "--tipo" => &mut form.tipo,
        "--curso" => &mut form.curso,
        "--descripcion" => &mut form.descripcion,
        "--evento" => &mut form.fecha_evento,
        "--limite" => &mut form.fecha_limite,
        other => return Err(usage_error(&format!("Opción desconocida: {}", other))),
    };
    *slot = value;
    Ok(())
}

/// `"nombre|fecha|horas"`; validation happens later on the form.
fn parse_subtask_arg(raw: &str) -> Result<SubtaskForm, AppError> {
    let mut parts = raw.splitn(3, '|');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(nombre), Some(fecha), Some(horas)) => Ok(SubtaskForm {
            nombre: nombre.to_string(),
            fecha_objetivo: fecha.to_string(),
            horas_estimadas: horas.to_string(),
        }),
        _ => Err(usage_error(&format!(
            "Subtarea inválida \"{}\", usa \"nombre|fecha|horas\".",
            raw
        ))),
    }
}

fn flags(args: &[String]) -> Result<Vec<(&str, String)>, AppError> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        if !flag.starts_with("--") {
            return Err(usage_error(&format!("Argumento inesperado: {}", flag)));
        }
        let value = iter
            .next()
            .ok_or_else(|| usage_error(&format!("Falta el valor de {}", flag)))?;
        out.push((flag.as_str(), value.clone()));
    }
    Ok(out)
}

fn take_yes(args: &[String]) -> (Vec<String>, bool) {
    let confirmed = args.iter().any(|a| a == "--yes" || a == "-y");
    let rest = args
        .iter()
        .filter(|a| *a != "--yes" && *a != "-y")
        .cloned()
        .collect();
    (rest, confirmed)
}

fn positional<const N: usize>(args: &[String], command: &str) -> Result<[String; N], AppError> {
    <[String; N]>::try_from(args.to_vec()).map_err(|_| {
        usage_error(&format!(
            "\"{}\" espera {} argumento(s), recibió {}.",
            command,
            N,
            args.len()
        ))
    })
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .map_err(|_| usage_error(&format!("Id inválido: {}", raw)))
}

fn usage_error(message: &str) -> AppError {
    AppError::Validation(message.to_string())
}
