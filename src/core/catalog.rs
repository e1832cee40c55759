// =============================================================================
// CATALOG : Les douze rapports
// =============================================================================
//
// Chaque rapport est une ReportSpec complète. Tous partent de `grades` :
// un étudiant, une discipline ou un groupe n'apparaissent donc que s'ils ont
// au moins une note.
//
// Les noms stables (select_one … select_twelve) servent à l'appel dynamique
// (`report::run_named`) ; les variantes de ReportId servent à l'appel typé.
//
// =============================================================================

use super::query::{
    ColumnRef, Expr, Filter, OrderBy, ParamSpec, Projection, ReportSpec, SortDirection,
};
use super::schema::{Path, GRADES, ID_COLUMN};
use super::typeside::BaseType;

/// Nombre de décimales des moyennes
pub const AVG_PLACES: u32 = 2;

/// Taille du palmarès (rapport 1)
pub const TOP_STUDENTS: usize = 5;

const STUDENT: &[&str] = &["student_id"];
const GROUP: &[&str] = &["student_id", "group_id"];
const DISCIPLINE: &[&str] = &["discipline_id"];
const TEACHER: &[&str] = &["discipline_id", "teacher_id"];
const GRADE: &[&str] = &[];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportId {
    TopStudents,
    BestStudentInDiscipline,
    GroupAveragesInDiscipline,
    OverallAverage,
    TeacherDisciplines,
    GroupRoster,
    GroupGradesInDiscipline,
    TeacherAverages,
    StudentDisciplines,
    StudentTeacherDisciplines,
    StudentTeacherAverage,
    LatestGrades,
}

impl ReportId {
    pub fn all() -> [ReportId; 12] {
        use ReportId::*;
        [
            TopStudents,
            BestStudentInDiscipline,
            GroupAveragesInDiscipline,
            OverallAverage,
            TeacherDisciplines,
            GroupRoster,
            GroupGradesInDiscipline,
            TeacherAverages,
            StudentDisciplines,
            StudentTeacherDisciplines,
            StudentTeacherAverage,
            LatestGrades,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReportId::TopStudents => "select_one",
            ReportId::BestStudentInDiscipline => "select_two",
            ReportId::GroupAveragesInDiscipline => "select_three",
            ReportId::OverallAverage => "select_four",
            ReportId::TeacherDisciplines => "select_five",
            ReportId::GroupRoster => "select_six",
            ReportId::GroupGradesInDiscipline => "select_seven",
            ReportId::TeacherAverages => "select_eight",
            ReportId::StudentDisciplines => "select_nine",
            ReportId::StudentTeacherDisciplines => "select_ten",
            ReportId::StudentTeacherAverage => "select_eleven",
            ReportId::LatestGrades => "select_twelve",
        }
    }

    pub fn from_name(name: &str) -> Option<ReportId> {
        ReportId::all().into_iter().find(|id| id.name() == name)
    }

    /// La question à laquelle répond le rapport
    pub fn question(&self) -> &'static str {
        match self {
            ReportId::TopStudents => "Top 5 students by average grade across all disciplines",
            ReportId::BestStudentInDiscipline => {
                "Student with the highest average grade in a discipline"
            }
            ReportId::GroupAveragesInDiscipline => "Average grade per group in a discipline",
            ReportId::OverallAverage => "Average grade across the whole grade table",
            ReportId::TeacherDisciplines => "Disciplines taught by a teacher",
            ReportId::GroupRoster => "Students in a group",
            ReportId::GroupGradesInDiscipline => "Grades of a group's students in a discipline",
            ReportId::TeacherAverages => "Average grade a teacher gives per discipline",
            ReportId::StudentDisciplines => "Disciplines a student attends",
            ReportId::StudentTeacherDisciplines => "Disciplines a teacher teaches to a student",
            ReportId::StudentTeacherAverage => "Average grade a teacher gives to a student",
            ReportId::LatestGrades => "Grades of a group in a discipline on the latest lesson",
        }
    }

    pub fn spec(&self) -> ReportSpec {
        match self {
            ReportId::TopStudents => top_students(),
            ReportId::BestStudentInDiscipline => best_student_in_discipline(),
            ReportId::GroupAveragesInDiscipline => group_averages_in_discipline(),
            ReportId::OverallAverage => overall_average(),
            ReportId::TeacherDisciplines => teacher_disciplines(),
            ReportId::GroupRoster => group_roster(),
            ReportId::GroupGradesInDiscipline => group_grades_in_discipline(),
            ReportId::TeacherAverages => teacher_averages(),
            ReportId::StudentDisciplines => student_disciplines(),
            ReportId::StudentTeacherDisciplines => student_teacher_disciplines(),
            ReportId::StudentTeacherAverage => student_teacher_average(),
            ReportId::LatestGrades => latest_grades(),
        }
    }
}

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ─── Briques ─────────────────────────────────────────────────────────────────

fn col(edges: &[&str], column: &str) -> ColumnRef {
    ColumnRef::new(Path::new(GRADES, edges.to_vec()), column)
}

fn show(alias: &str, edges: &[&str], column: &str) -> Projection {
    Projection::new(alias, Expr::Column(col(edges, column)))
}

fn avg_grade() -> Projection {
    Projection::new(
        "avg_grade",
        Expr::RoundedAvg {
            column: col(GRADE, "grade"),
            places: AVG_PLACES,
        },
    )
}

fn id_param(name: &str) -> ParamSpec {
    ParamSpec::new(name, BaseType::Integer)
}

fn by_id(edges: &[&str], param: &str) -> Filter {
    Filter::new(col(edges, ID_COLUMN), param)
}

fn spec(name: &str) -> ReportSpec {
    ReportSpec {
        name: name.to_string(),
        root: GRADES.to_string(),
        params: vec![],
        projections: vec![],
        filters: vec![],
        group_by: vec![],
        order_by: vec![],
        limit: None,
        latest: None,
    }
}

// ─── Les rapports ────────────────────────────────────────────────────────────

fn top_students() -> ReportSpec {
    ReportSpec {
        projections: vec![show("student", STUDENT, "fullname"), avg_grade()],
        // l'identité de l'étudiant, pas son nom : deux homonymes restent distincts
        group_by: vec![col(STUDENT, ID_COLUMN)],
        order_by: vec![OrderBy::alias_desc("avg_grade")],
        limit: Some(TOP_STUDENTS),
        ..spec("select_one")
    }
}

fn best_student_in_discipline() -> ReportSpec {
    ReportSpec {
        params: vec![id_param("discipline_id")],
        projections: vec![
            show("discipline", DISCIPLINE, "name"),
            show("student", STUDENT, "fullname"),
            avg_grade(),
        ],
        filters: vec![by_id(DISCIPLINE, "discipline_id")],
        group_by: vec![col(STUDENT, ID_COLUMN), col(DISCIPLINE, "name")],
        order_by: vec![OrderBy::alias_desc("avg_grade")],
        limit: Some(1),
        ..spec("select_two")
    }
}

fn group_averages_in_discipline() -> ReportSpec {
    ReportSpec {
        params: vec![id_param("discipline_id")],
        projections: vec![
            show("discipline", DISCIPLINE, "name"),
            show("group", GROUP, "name"),
            avg_grade(),
        ],
        filters: vec![by_id(DISCIPLINE, "discipline_id")],
        group_by: vec![col(GROUP, ID_COLUMN), col(DISCIPLINE, "name")],
        order_by: vec![OrderBy::alias_desc("avg_grade")],
        ..spec("select_three")
    }
}

fn overall_average() -> ReportSpec {
    ReportSpec {
        projections: vec![avg_grade()],
        // une seule ligne : le tri est sans effet mais conservé tel quel
        order_by: vec![OrderBy::alias_desc("avg_grade")],
        ..spec("select_four")
    }
}

fn teacher_disciplines() -> ReportSpec {
    ReportSpec {
        params: vec![id_param("teacher_id")],
        projections: vec![
            show("teacher", TEACHER, "fullname"),
            show("discipline", DISCIPLINE, "name"),
        ],
        filters: vec![by_id(TEACHER, "teacher_id")],
        group_by: vec![col(TEACHER, "fullname"), col(DISCIPLINE, "name")],
        ..spec("select_five")
    }
}

fn group_roster() -> ReportSpec {
    ReportSpec {
        params: vec![id_param("group_id")],
        projections: vec![
            show("group", GROUP, "name"),
            show("student", STUDENT, "fullname"),
        ],
        filters: vec![by_id(GROUP, "group_id")],
        group_by: vec![col(GROUP, "name"), col(STUDENT, "fullname")],
        ..spec("select_six")
    }
}

fn group_grades_in_discipline() -> ReportSpec {
    ReportSpec {
        params: vec![id_param("discipline_id"), id_param("group_id")],
        projections: vec![
            show("discipline", DISCIPLINE, "name"),
            show("group", GROUP, "name"),
            show("student", STUDENT, "fullname"),
            show("grade", GRADE, "grade"),
        ],
        filters: vec![
            by_id(DISCIPLINE, "discipline_id"),
            by_id(GROUP, "group_id"),
        ],
        group_by: vec![
            col(DISCIPLINE, "name"),
            col(GROUP, "name"),
            col(STUDENT, "fullname"),
            col(GRADE, "grade"),
        ],
        ..spec("select_seven")
    }
}

fn teacher_averages() -> ReportSpec {
    ReportSpec {
        params: vec![id_param("teacher_id")],
        projections: vec![
            show("teacher", TEACHER, "fullname"),
            show("discipline", DISCIPLINE, "name"),
            avg_grade(),
        ],
        filters: vec![by_id(TEACHER, "teacher_id")],
        group_by: vec![col(TEACHER, "fullname"), col(DISCIPLINE, "name")],
        ..spec("select_eight")
    }
}

fn student_disciplines() -> ReportSpec {
    ReportSpec {
        params: vec![id_param("student_id")],
        projections: vec![
            show("student", STUDENT, "fullname"),
            show("discipline", DISCIPLINE, "name"),
        ],
        filters: vec![by_id(STUDENT, "student_id")],
        group_by: vec![col(STUDENT, "fullname"), col(DISCIPLINE, "name")],
        ..spec("select_nine")
    }
}

fn student_teacher_disciplines() -> ReportSpec {
    ReportSpec {
        params: vec![id_param("student_id"), id_param("teacher_id")],
        projections: vec![
            show("student", STUDENT, "fullname"),
            show("teacher", TEACHER, "fullname"),
            show("discipline", DISCIPLINE, "name"),
        ],
        filters: vec![by_id(STUDENT, "student_id"), by_id(TEACHER, "teacher_id")],
        group_by: vec![
            col(STUDENT, "fullname"),
            col(TEACHER, "fullname"),
            col(DISCIPLINE, "name"),
        ],
        ..spec("select_ten")
    }
}

fn student_teacher_average() -> ReportSpec {
    ReportSpec {
        params: vec![id_param("student_id"), id_param("teacher_id")],
        projections: vec![
            show("student", STUDENT, "fullname"),
            show("teacher", TEACHER, "fullname"),
            avg_grade(),
        ],
        filters: vec![by_id(STUDENT, "student_id"), by_id(TEACHER, "teacher_id")],
        group_by: vec![col(STUDENT, "fullname"), col(TEACHER, "fullname")],
        ..spec("select_eleven")
    }
}

fn latest_grades() -> ReportSpec {
    ReportSpec {
        params: vec![id_param("discipline_id"), id_param("group_id")],
        projections: vec![
            show("discipline", DISCIPLINE, "name"),
            show("student", STUDENT, "fullname"),
            show("group", GROUP, "name"),
            show("date_of", GRADE, "date_of"),
            show("grade", GRADE, "grade"),
        ],
        filters: vec![
            by_id(DISCIPLINE, "discipline_id"),
            by_id(GROUP, "group_id"),
        ],
        order_by: vec![
            OrderBy::column(col(GRADE, "date_of"), SortDirection::Desc),
            OrderBy::column(col(STUDENT, "fullname"), SortDirection::Asc),
            OrderBy::column(col(GRADE, ID_COLUMN), SortDirection::Asc),
        ],
        latest: Some(col(GRADE, "date_of")),
        ..spec("select_twelve")
    }
}
