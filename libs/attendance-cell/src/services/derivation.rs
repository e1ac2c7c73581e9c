use chrono::NaiveDateTime;

use crate::models::AttendanceStatus;

/// Result of deriving a shift's attendance state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftDerivation {
    pub estado: AttendanceStatus,
    pub minutos_atraso: i64,
    pub minutos_trabajados: Option<i64>,
}

/// Derives the attendance state of one scheduled shift from its entry/exit
/// marks and the current time. A justification overrides everything else.
pub fn derive_shift_status(
    inicio_programado: NaiveDateTime,
    fin_programado: NaiveDateTime,
    entrada: Option<NaiveDateTime>,
    salida: Option<NaiveDateTime>,
    justificado: bool,
    ahora: NaiveDateTime,
) -> ShiftDerivation {
    if justificado {
        return ShiftDerivation {
            estado: AttendanceStatus::Justificado,
            minutos_atraso: 0,
            minutos_trabajados: None,
        };
    }

    match entrada {
        Some(entrada) => {
            let minutos_atraso = ((entrada - inicio_programado).num_minutes()).max(0);
            let minutos_trabajados = match salida {
                Some(salida) => (salida - entrada).num_minutes(),
                None => (ahora - entrada).num_minutes(),
            };
            let estado = if minutos_atraso > 0 {
                AttendanceStatus::Atraso
            } else if salida.is_some() {
                AttendanceStatus::Asistio
            } else {
                AttendanceStatus::EnTurno
            };
            ShiftDerivation {
                estado,
                minutos_atraso,
                minutos_trabajados: Some(minutos_trabajados),
            }
        }
        None => {
            let estado = if ahora >= fin_programado {
                AttendanceStatus::Ausente
            } else if ahora >= inicio_programado {
                AttendanceStatus::Atraso
            } else {
                AttendanceStatus::Programado
            };
            ShiftDerivation {
                estado,
                minutos_atraso: 0,
                minutos_trabajados: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    const INICIO: &str = "2025-06-16T12:00:00";
    const FIN: &str = "2025-06-16T18:00:00";

    #[test]
    fn scheduled_before_shift_start() {
        let d = derive_shift_status(ts(INICIO), ts(FIN), None, None, false, ts("2025-06-16T11:00:00"));
        assert_eq!(d.estado, AttendanceStatus::Programado);
        assert_eq!(d.minutos_trabajados, None);
    }

    #[test]
    fn unmarked_after_start_is_late() {
        let d = derive_shift_status(ts(INICIO), ts(FIN), None, None, false, ts("2025-06-16T12:20:00"));
        assert_eq!(d.estado, AttendanceStatus::Atraso);
    }

    #[test]
    fn unmarked_after_end_is_absent() {
        let d = derive_shift_status(ts(INICIO), ts(FIN), None, None, false, ts("2025-06-16T18:30:00"));
        assert_eq!(d.estado, AttendanceStatus::Ausente);
    }

    #[test]
    fn on_time_entry_without_exit_is_on_shift() {
        let d = derive_shift_status(
            ts(INICIO),
            ts(FIN),
            Some(ts("2025-06-16T11:58:00")),
            None,
            false,
            ts("2025-06-16T14:00:00"),
        );
        assert_eq!(d.estado, AttendanceStatus::EnTurno);
        assert_eq!(d.minutos_atraso, 0);
        assert_eq!(d.minutos_trabajados, Some(122));
    }

    #[test]
    fn late_entry_stays_late_even_after_exit() {
        let d = derive_shift_status(
            ts(INICIO),
            ts(FIN),
            Some(ts("2025-06-16T12:15:00")),
            Some(ts("2025-06-16T18:00:00")),
            false,
            ts("2025-06-16T19:00:00"),
        );
        assert_eq!(d.estado, AttendanceStatus::Atraso);
        assert_eq!(d.minutos_atraso, 15);
        assert_eq!(d.minutos_trabajados, Some(345));
    }

    #[test]
    fn completed_on_time_shift_is_attended() {
        let d = derive_shift_status(
            ts(INICIO),
            ts(FIN),
            Some(ts(INICIO)),
            Some(ts(FIN)),
            false,
            ts("2025-06-16T19:00:00"),
        );
        assert_eq!(d.estado, AttendanceStatus::Asistio);
        assert_eq!(d.minutos_trabajados, Some(360));
    }

    #[test]
    fn justification_overrides_absence() {
        let d = derive_shift_status(ts(INICIO), ts(FIN), None, None, true, ts("2025-06-16T19:00:00"));
        assert_eq!(d.estado, AttendanceStatus::Justificado);
    }
}
