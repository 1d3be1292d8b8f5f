use crate::collapse_ws;
use crate::names;

/// `GRTOBJAUT`: grant object authority to users or via an authorization
/// list.
#[derive(Debug, Clone)]
pub struct Grtobjaut {
    library: String,
    object: String,
    object_type: String,
    asp_device: String,
    grant: Grant,
    replace: bool,
}

#[derive(Debug, Clone)]
enum Grant {
    Users {
        users: Vec<String>,
        authorities: Vec<String>,
    },
    AuthorizationList {
        list: String,
    },
}

impl Grtobjaut {
    pub fn to_users(
        library: impl Into<String>,
        object: impl Into<String>,
        object_type: impl Into<String>,
        users: Vec<String>,
        authorities: Vec<String>,
    ) -> Self {
        Self {
            library: library.into(),
            object: object.into(),
            object_type: object_type.into(),
            asp_device: "*".to_string(),
            grant: Grant::Users { users, authorities },
            replace: false,
        }
    }

    pub fn with_authorization_list(
        library: impl Into<String>,
        object: impl Into<String>,
        object_type: impl Into<String>,
        list: impl Into<String>,
    ) -> Self {
        Self {
            library: library.into(),
            object: object.into(),
            object_type: object_type.into(),
            asp_device: "*".to_string(),
            grant: Grant::AuthorizationList { list: list.into() },
            replace: false,
        }
    }

    pub fn asp_device(mut self, asp_device: impl Into<String>) -> Self {
        self.asp_device = asp_device.into();
        self
    }

    pub fn replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    pub fn render(&self) -> anyhow::Result<String> {
        let library = names::object_name_or_special("object library", &self.library)?;
        let object = names::object_name("object name", &self.object)?;
        match &self.grant {
            Grant::Users { users, authorities } => {
                if users.is_empty() {
                    anyhow::bail!("GRTOBJAUT requires at least one user");
                }
                if authorities.is_empty() {
                    anyhow::bail!("GRTOBJAUT requires at least one authority");
                }
                Ok(collapse_ws(&format!(
                    "QSYS/GRTOBJAUT OBJ({library}/{object}) OBJTYPE({object_type}) \
                     ASPDEV({asp}) USER({users}) AUT({authorities}) REPLACE({replace})",
                    object_type = self.object_type,
                    asp = self.asp_device,
                    users = users.join(" "),
                    authorities = authorities.join(" "),
                    replace = if self.replace { "*YES" } else { "*NO" },
                )))
            }
            Grant::AuthorizationList { list } => {
                let list = names::object_name("authorization list", list)?;
                Ok(collapse_ws(&format!(
                    "QSYS/GRTOBJAUT OBJ({library}/{object}) OBJTYPE({object_type}) \
                     ASPDEV({asp}) AUTL({list})",
                    object_type = self.object_type,
                    asp = self.asp_device,
                )))
            }
        }
    }
}

/// `RVKOBJAUT`: revoke object authority.
#[derive(Debug, Clone)]
pub struct Rvkobjaut {
    library: String,
    object: String,
    object_type: String,
    asp_device: String,
    users: Vec<String>,
    authorities: Vec<String>,
}

impl Rvkobjaut {
    pub fn new(
        library: impl Into<String>,
        object: impl Into<String>,
        object_type: impl Into<String>,
        users: Vec<String>,
        authorities: Vec<String>,
    ) -> Self {
        Self {
            library: library.into(),
            object: object.into(),
            object_type: object_type.into(),
            asp_device: "*".to_string(),
            users,
            authorities,
        }
    }

    pub fn asp_device(mut self, asp_device: impl Into<String>) -> Self {
        self.asp_device = asp_device.into();
        self
    }

    pub fn render(&self) -> anyhow::Result<String> {
        let library = names::object_name_or_special("object library", &self.library)?;
        let object = names::object_name("object name", &self.object)?;
        if self.users.is_empty() {
            anyhow::bail!("RVKOBJAUT requires at least one user");
        }
        if self.authorities.is_empty() {
            anyhow::bail!("RVKOBJAUT requires at least one authority");
        }
        Ok(collapse_ws(&format!(
            "QSYS/RVKOBJAUT OBJ({library}/{object}) OBJTYPE({object_type}) \
             ASPDEV({asp}) USER({users}) AUT({authorities})",
            object_type = self.object_type,
            asp = self.asp_device,
            users = self.users.join(" "),
            authorities = self.authorities.join(" "),
        )))
    }
}
