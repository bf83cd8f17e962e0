use crate::api::decode::parse_date;
use crate::error::AppError;
use crate::models::{NewSubtask, SubtaskStatus};

use super::{Validate, required};

/// Raw input of the "add subtask" form.
#[derive(Debug, Clone, Default)]
pub struct SubtaskForm {
    pub nombre: String,
    pub fecha_objetivo: String,
    pub horas_estimadas: String,
}

impl Validate for SubtaskForm {
    type Output = NewSubtask;

    fn validate(&self) -> Result<NewSubtask, AppError> {
        let nombre = required(&self.nombre, "El nombre es obligatorio.")?;
        let fecha = required(&self.fecha_objetivo, "La fecha objetivo es obligatoria.")?;
        let fecha_objetivo = parse_date(&fecha)
            .ok_or_else(|| AppError::Validation("La fecha objetivo no es válida.".to_string()))?;

        let horas_estimadas = self
            .horas_estimadas
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .ok()
            .filter(|h| h.is_finite() && *h > 0.0)
            .ok_or_else(|| AppError::Validation("Las horas deben ser mayores a 0.".to_string()))?;

        Ok(NewSubtask {
            nombre,
            fecha_objetivo,
            horas_estimadas,
            estado: SubtaskStatus::Pending,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn form(nombre: &str, fecha: &str, horas: &str) -> SubtaskForm {
        SubtaskForm {
            nombre: nombre.into(),
            fecha_objetivo: fecha.into(),
            horas_estimadas: horas.into(),
        }
    }

    fn message(f: SubtaskForm) -> String {
        f.validate().unwrap_err().to_string()
    }

    #[test]
    fn valid_form_builds_request() {
        let new = form(" Estudiar capítulo 3 ", "2024-05-02", "1,5").validate().unwrap();
        assert_eq!(new.nombre, "Estudiar capítulo 3");
        assert_eq!(new.fecha_objetivo, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(new.horas_estimadas, 1.5);
        assert_eq!(new.estado, SubtaskStatus::Pending);
    }

    #[test]
    fn rules_apply_in_order() {
        assert_eq!(message(form("", "", "0")), "El nombre es obligatorio.");
        assert_eq!(message(form("Leer", "", "0")), "La fecha objetivo es obligatoria.");
        assert_eq!(message(form("Leer", "2024-05-02", "0")), "Las horas deben ser mayores a 0.");
    }

    #[test]
    fn non_positive_hours_are_rejected() {
        for horas in ["0", "-1", "", "abc", "NaN"] {
            assert_eq!(message(form("Leer", "2024-05-02", horas)), "Las horas deben ser mayores a 0.");
        }
    }
}
