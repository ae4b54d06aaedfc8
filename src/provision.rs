//! Lazily creates the local student row for a provider identity.

use crate::err::Error;
use crate::models::{ProviderUser, StudentView};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct Provisioner {
    store: Store,
}

impl Provisioner {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Finds or creates the student for `user`.
    ///
    /// Two first visits racing each other both try the insert; the loser hits
    /// the unique index on `external_identity` and reads the winner's row.
    pub async fn ensure_student(&self, user: &ProviderUser) -> Result<StudentView, Error> {
        if let Some(student) = self.store.find_student_by_identity(&user.id).await? {
            return Ok(StudentView {
                user: user.clone(),
                college_name: student.college_name,
            });
        }

        match self
            .store
            .insert_student(&user.id, &user.email, Some(user.display_name()), None)
            .await
        {
            Ok(id) => {
                log::info!("Provisioned student {} for identity {}", id, user.id);
                Ok(StudentView {
                    user: user.clone(),
                    college_name: None,
                })
            }
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                let student = self
                    .store
                    .find_student_by_identity(&user.id)
                    .await?
                    .ok_or_else(|| {
                        Error::internal("DatabaseError", "student vanished after insert conflict")
                    })?;
                Ok(StudentView {
                    user: user.clone(),
                    college_name: student.college_name,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn complete_profile(&self, user: &ProviderUser, college_name: &str) -> Result<(), Error> {
        let college_name = college_name.trim();
        if college_name.is_empty() {
            return Err(Error::invalid("College name is required"));
        }

        if self.store.set_college_name(&user.id, college_name).await? == 0 {
            // profile submitted before the first /api/users/me
            self.ensure_student(user).await?;
            self.store.set_college_name(&user.id, college_name).await?;
        }
        Ok(())
    }
}
