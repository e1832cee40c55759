// =============================================================================
// REPORTS : Les douze opérations typées
// =============================================================================
//
// Façade au-dessus de `report::run_report` : chaque opération prend des
// identifiants entiers et retourne des lignes de forme fixe.
//
//   let rows = store.with_session(|s| Reports::new(s).top_students())?;
//
// Un identifiant inconnu donne une liste vide.
//
// =============================================================================

use chrono::NaiveDate;
use serde::Serialize;

use crate::core::catalog::ReportId;
use crate::core::typeside::Value;
use crate::error::{ReportError, Result, StorageError};
use crate::report::{run_report, Record, RowSource};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentAverage {
    pub student: String,
    pub avg_grade: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisciplineBest {
    pub discipline: String,
    pub student: String,
    pub avg_grade: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupAverage {
    pub discipline: String,
    pub group: String,
    pub avg_grade: f64,
}

/// NULL quand la table des notes est vide
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallAverage {
    pub avg_grade: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeacherDiscipline {
    pub teacher: String,
    pub discipline: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMember {
    pub group: String,
    pub student: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupGrade {
    pub discipline: String,
    pub group: String,
    pub student: String,
    pub grade: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeacherAverage {
    pub teacher: String,
    pub discipline: String,
    pub avg_grade: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentDiscipline {
    pub student: String,
    pub discipline: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentTeacherDiscipline {
    pub student: String,
    pub teacher: String,
    pub discipline: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentTeacherAverage {
    pub student: String,
    pub teacher: String,
    pub avg_grade: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestGrade {
    pub discipline: String,
    pub student: String,
    pub group: String,
    pub date_of: NaiveDate,
    pub grade: i64,
}

// ─── Décodage Record → ligne typée ───────────────────────────────────────────

impl TryFrom<Record> for StudentAverage {
    type Error = StorageError;
    fn try_from(r: Record) -> std::result::Result<Self, StorageError> {
        Ok(StudentAverage {
            student: r.text("student")?,
            avg_grade: r.float("avg_grade")?,
        })
    }
}

impl TryFrom<Record> for DisciplineBest {
    type Error = StorageError;
    fn try_from(r: Record) -> std::result::Result<Self, StorageError> {
        Ok(DisciplineBest {
            discipline: r.text("discipline")?,
            student: r.text("student")?,
            avg_grade: r.float("avg_grade")?,
        })
    }
}

impl TryFrom<Record> for GroupAverage {
    type Error = StorageError;
    fn try_from(r: Record) -> std::result::Result<Self, StorageError> {
        Ok(GroupAverage {
            discipline: r.text("discipline")?,
            group: r.text("group")?,
            avg_grade: r.float("avg_grade")?,
        })
    }
}

impl TryFrom<Record> for OverallAverage {
    type Error = StorageError;
    fn try_from(r: Record) -> std::result::Result<Self, StorageError> {
        Ok(OverallAverage {
            avg_grade: r.opt_float("avg_grade")?,
        })
    }
}

impl TryFrom<Record> for TeacherDiscipline {
    type Error = StorageError;
    fn try_from(r: Record) -> std::result::Result<Self, StorageError> {
        Ok(TeacherDiscipline {
            teacher: r.text("teacher")?,
            discipline: r.text("discipline")?,
        })
    }
}

impl TryFrom<Record> for GroupMember {
    type Error = StorageError;
    fn try_from(r: Record) -> std::result::Result<Self, StorageError> {
        Ok(GroupMember {
            group: r.text("group")?,
            student: r.text("student")?,
        })
    }
}

impl TryFrom<Record> for GroupGrade {
    type Error = StorageError;
    fn try_from(r: Record) -> std::result::Result<Self, StorageError> {
        Ok(GroupGrade {
            discipline: r.text("discipline")?,
            group: r.text("group")?,
            student: r.text("student")?,
            grade: r.integer("grade")?,
        })
    }
}

impl TryFrom<Record> for TeacherAverage {
    type Error = StorageError;
    fn try_from(r: Record) -> std::result::Result<Self, StorageError> {
        Ok(TeacherAverage {
            teacher: r.text("teacher")?,
            discipline: r.text("discipline")?,
            avg_grade: r.float("avg_grade")?,
        })
    }
}

impl TryFrom<Record> for StudentDiscipline {
    type Error = StorageError;
    fn try_from(r: Record) -> std::result::Result<Self, StorageError> {
        Ok(StudentDiscipline {
            student: r.text("student")?,
            discipline: r.text("discipline")?,
        })
    }
}

impl TryFrom<Record> for StudentTeacherDiscipline {
    type Error = StorageError;
    fn try_from(r: Record) -> std::result::Result<Self, StorageError> {
        Ok(StudentTeacherDiscipline {
            student: r.text("student")?,
            teacher: r.text("teacher")?,
            discipline: r.text("discipline")?,
        })
    }
}

impl TryFrom<Record> for StudentTeacherAverage {
    type Error = StorageError;
    fn try_from(r: Record) -> std::result::Result<Self, StorageError> {
        Ok(StudentTeacherAverage {
            student: r.text("student")?,
            teacher: r.text("teacher")?,
            avg_grade: r.float("avg_grade")?,
        })
    }
}

impl TryFrom<Record> for LatestGrade {
    type Error = StorageError;
    fn try_from(r: Record) -> std::result::Result<Self, StorageError> {
        Ok(LatestGrade {
            discipline: r.text("discipline")?,
            student: r.text("student")?,
            group: r.text("group")?,
            date_of: r.date("date_of")?,
            grade: r.integer("grade")?,
        })
    }
}

// ─── Façade ──────────────────────────────────────────────────────────────────

pub struct Reports<'s, S: RowSource + ?Sized> {
    source: &'s S,
}

impl<'s, S: RowSource + ?Sized> Reports<'s, S> {
    pub fn new(source: &'s S) -> Self {
        Reports { source }
    }

    fn typed<T>(&self, id: ReportId, params: &[i64]) -> Result<Vec<T>>
    where
        T: TryFrom<Record, Error = StorageError>,
    {
        let params: Vec<Value> = params.iter().copied().map(Value::Integer).collect();
        run_report(self.source, id, &params)?
            .into_iter()
            .map(|r| T::try_from(r).map_err(ReportError::from))
            .collect()
    }

    /// 1. Les 5 meilleures moyennes, toutes disciplines confondues
    pub fn top_students(&self) -> Result<Vec<StudentAverage>> {
        self.typed(ReportId::TopStudents, &[])
    }

    /// 2. La meilleure moyenne d'une discipline (au plus une ligne)
    pub fn best_student_in_discipline(&self, discipline_id: i64) -> Result<Vec<DisciplineBest>> {
        self.typed(ReportId::BestStudentInDiscipline, &[discipline_id])
    }

    /// 3. Moyenne de chaque groupe dans une discipline, de la meilleure à la moins bonne
    pub fn group_averages_in_discipline(&self, discipline_id: i64) -> Result<Vec<GroupAverage>> {
        self.typed(ReportId::GroupAveragesInDiscipline, &[discipline_id])
    }

    /// 4. Moyenne de toute la table des notes (toujours une ligne)
    pub fn overall_average(&self) -> Result<Vec<OverallAverage>> {
        self.typed(ReportId::OverallAverage, &[])
    }

    pub fn teacher_disciplines(&self, teacher_id: i64) -> Result<Vec<TeacherDiscipline>> {
        self.typed(ReportId::TeacherDisciplines, &[teacher_id])
    }

    pub fn group_roster(&self, group_id: i64) -> Result<Vec<GroupMember>> {
        self.typed(ReportId::GroupRoster, &[group_id])
    }

    pub fn group_grades_in_discipline(
        &self,
        discipline_id: i64,
        group_id: i64,
    ) -> Result<Vec<GroupGrade>> {
        self.typed(ReportId::GroupGradesInDiscipline, &[discipline_id, group_id])
    }

    pub fn teacher_averages(&self, teacher_id: i64) -> Result<Vec<TeacherAverage>> {
        self.typed(ReportId::TeacherAverages, &[teacher_id])
    }

    pub fn student_disciplines(&self, student_id: i64) -> Result<Vec<StudentDiscipline>> {
        self.typed(ReportId::StudentDisciplines, &[student_id])
    }

    pub fn student_teacher_disciplines(
        &self,
        student_id: i64,
        teacher_id: i64,
    ) -> Result<Vec<StudentTeacherDiscipline>> {
        self.typed(ReportId::StudentTeacherDisciplines, &[student_id, teacher_id])
    }

    pub fn student_teacher_average(
        &self,
        student_id: i64,
        teacher_id: i64,
    ) -> Result<Vec<StudentTeacherAverage>> {
        self.typed(ReportId::StudentTeacherAverage, &[student_id, teacher_id])
    }

    /// 12. Les notes du dernier cours (date_of maximale) d'un groupe dans une
    /// discipline. Toutes les notes de cette date sont retournées.
    pub fn latest_grades(&self, discipline_id: i64, group_id: i64) -> Result<Vec<LatestGrade>> {
        self.typed(ReportId::LatestGrades, &[discipline_id, group_id])
    }
}
