use crate::collapse_ws;
use crate::names;

/// `CRTSAVF`: create a save file.
#[derive(Debug, Clone)]
pub struct Crtsavf {
    library: String,
    name: String,
}

impl Crtsavf {
    pub fn new(library: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            name: name.into(),
        }
    }

    pub fn render(&self) -> anyhow::Result<String> {
        let library = names::object_name("savefile library", &self.library)?;
        let name = names::object_name("savefile name", &self.name)?;
        Ok(format!("QSYS/CRTSAVF FILE({library}/{name})"))
    }
}

/// `CLRSAVF`: clear an existing save file so it can be reused.
#[derive(Debug, Clone)]
pub struct Clrsavf {
    library: String,
    name: String,
}

impl Clrsavf {
    pub fn new(library: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            name: name.into(),
        }
    }

    pub fn render(&self) -> anyhow::Result<String> {
        let library = names::object_name("savefile library", &self.library)?;
        let name = names::object_name("savefile name", &self.name)?;
        Ok(format!("QSYS/CLRSAVF FILE({library}/{name})"))
    }
}

/// `SAVOBJ`: save objects from a library into a save file.
#[derive(Debug, Clone)]
pub struct Savobj {
    objects: Vec<String>,
    library: String,
    object_types: String,
    savefile_library: String,
    savefile_name: String,
    device: String,
    target_release: String,
    parameters: String,
}

impl Savobj {
    pub fn new(
        library: impl Into<String>,
        savefile_library: impl Into<String>,
        savefile_name: impl Into<String>,
    ) -> Self {
        Self {
            objects: vec!["*ALL".to_string()],
            library: library.into(),
            object_types: "*ALL".to_string(),
            savefile_library: savefile_library.into(),
            savefile_name: savefile_name.into(),
            device: "*SAVF".to_string(),
            target_release: "*CURRENT".to_string(),
            parameters: String::new(),
        }
    }

    pub fn objects(mut self, objects: Vec<String>) -> Self {
        self.objects = objects;
        self
    }

    pub fn object_types(mut self, object_types: impl Into<String>) -> Self {
        self.object_types = object_types.into();
        self
    }

    pub fn target_release(mut self, target_release: impl Into<String>) -> Self {
        self.target_release = target_release.into();
        self
    }

    pub fn parameters(mut self, parameters: impl Into<String>) -> Self {
        self.parameters = parameters.into();
        self
    }

    pub fn render(&self) -> anyhow::Result<String> {
        if self.objects.is_empty() {
            anyhow::bail!("SAVOBJ requires at least one object name");
        }
        let mut rendered_objects = Vec::with_capacity(self.objects.len());
        for object in &self.objects {
            rendered_objects.push(names::object_name_or_special("object name", object)?);
        }
        let library = names::object_name("object library", &self.library)?;
        let savefile_library = names::object_name("savefile library", &self.savefile_library)?;
        let savefile_name = names::object_name("savefile name", &self.savefile_name)?;
        Ok(collapse_ws(&format!(
            "QSYS/SAVOBJ OBJ({objects}) LIB({library}) DEV({device}) OBJTYPE({types}) \
             SAVF({savefile_library}/{savefile_name}) TGTRLS({release}) {parameters}",
            objects = rendered_objects.join(" "),
            device = self.device,
            types = self.object_types,
            release = self.target_release,
            parameters = self.parameters,
        )))
    }
}

/// `RSTOBJ`: restore objects from a save file.
#[derive(Debug, Clone)]
pub struct Rstobj {
    objects: Vec<String>,
    saved_library: String,
    object_types: String,
    savefile_library: String,
    savefile_name: String,
    device: String,
    parameters: String,
}

impl Rstobj {
    pub fn new(
        saved_library: impl Into<String>,
        savefile_library: impl Into<String>,
        savefile_name: impl Into<String>,
    ) -> Self {
        Self {
            objects: vec!["*ALL".to_string()],
            saved_library: saved_library.into(),
            object_types: "*ALL".to_string(),
            savefile_library: savefile_library.into(),
            savefile_name: savefile_name.into(),
            device: "*SAVF".to_string(),
            parameters: String::new(),
        }
    }

    pub fn objects(mut self, objects: Vec<String>) -> Self {
        self.objects = objects;
        self
    }

    pub fn object_types(mut self, object_types: impl Into<String>) -> Self {
        self.object_types = object_types.into();
        self
    }

    pub fn parameters(mut self, parameters: impl Into<String>) -> Self {
        self.parameters = parameters.into();
        self
    }

    pub fn render(&self) -> anyhow::Result<String> {
        if self.objects.is_empty() {
            anyhow::bail!("RSTOBJ requires at least one object name");
        }
        let mut rendered_objects = Vec::with_capacity(self.objects.len());
        for object in &self.objects {
            rendered_objects.push(names::object_name_or_special("object name", object)?);
        }
        let saved_library = names::object_name("saved library", &self.saved_library)?;
        let savefile_library = names::object_name("savefile library", &self.savefile_library)?;
        let savefile_name = names::object_name("savefile name", &self.savefile_name)?;
        Ok(collapse_ws(&format!(
            "QSYS/RSTOBJ OBJ({objects}) SAVLIB({saved_library}) DEV({device}) OBJTYPE({types}) \
             SAVF({savefile_library}/{savefile_name}) {parameters}",
            objects = rendered_objects.join(" "),
            device = self.device,
            types = self.object_types,
            parameters = self.parameters,
        )))
    }
}
