use crate::memory::ConversationMemory;
use crate::profile::InterviewContext;
use crate::session::ResponseRecord;

/// Prompt builders for the generator calls the controller makes. Kept in one
/// place so the wording can be tuned without touching control flow.
pub struct InterviewPrompts;

impl InterviewPrompts {
    /// Prompt asking the generator to produce the full interview script as
    /// JSON. Demo mode asks for fewer questions.
    pub fn script(context: &InterviewContext, demo_mode: bool) -> String {
        let (job_count, tech_count, fit_count, behave_count) = if demo_mode {
            ("2", "1", "1", "1")
        } else {
            ("5", "3-5", "2-3", "3-4")
        };

        format!(
            "You are an AI interviewer for {company}. You need to conduct an interview for the \
             {title} position.\n\n\
             Job Description:\n{job_description}\n\n\
             Required Skills:\n{skills}\n\n\
             Company Information:\n{company_description}\n\
             Company Values: {values}\n\n\
             Candidate Information:\n\
             Name: {candidate}\n\
             Experience: {experience}\n\
             Background: {background}\n\n\
             Create a professional interview script with:\n\
             1. A personalized introduction welcoming the candidate\n\
             2. A set of interview questions categorized as:\n\
                - Job-specific questions ({job_count} questions)\n\
                - Technical questions ({tech_count} questions)\n\
                - Company fit questions ({fit_count} questions)\n\
                - Behavioral questions ({behave_count} questions)\n\
             3. A professional closing statement\n\n\
             For each question, include:\n\
             - The question text\n\
             - The purpose of asking this question\n\
             - What to look for in a good answer\n\n\
             IMPORTANT: Use a diverse range of question formats to make the interview feel \
             natural and varied. Avoid falling into repetitive patterns like starting every \
             question with \"Can you share an example of...\". Make each question distinct in \
             its structure and wording.\n\n\
             Format the response as JSON with the following structure:\n\
             ```json\n\
             {{\n\
                 \"introduction\": \"...\",\n\
                 \"questions\": {{\n\
                     \"job_specific\": [\n\
                         {{\"question\": \"...\", \"purpose\": \"...\", \"good_answer_criteria\": \"...\"}}\n\
                     ],\n\
                     \"technical\": [\n\
                         {{\"question\": \"...\", \"purpose\": \"...\", \"good_answer_criteria\": \"...\"}}\n\
                     ],\n\
                     \"company_fit\": [\n\
                         {{\"question\": \"...\", \"purpose\": \"...\", \"good_answer_criteria\": \"...\"}}\n\
                     ],\n\
                     \"behavioral\": [\n\
                         {{\"question\": \"...\", \"purpose\": \"...\", \"good_answer_criteria\": \"...\"}}\n\
                     ]\n\
                 }},\n\
                 \"closing\": \"...\"\n\
             }}\n\
             ```",
            company = context.company.name,
            title = context.job.title,
            job_description = context.job.description,
            skills = context.job.required_skills.join(", "),
            company_description = context.company.description,
            values = context.company.values,
            candidate = context.candidate.name,
            experience = context.candidate.experience,
            background = context.candidate.background,
        )
    }

    /// Prompt deciding whether a follow-up is warranted and what to ask.
    /// The generator must answer with the sentinel or a single question.
    pub fn follow_up(question: &str, response: &str) -> String {
        format!(
            "You are an expert technical interviewer with excellent conversational skills. \
             You need to decide if and how to follow up on a candidate's response.\n\n\
             CONVERSATION CONTEXT:\n\
             Original question: \"{question}\"\n\
             Candidate's response: \"{response}\"\n\n\
             If the response is truly comprehensive and no valuable follow-up is needed, \
             respond with EXACTLY: \"NO_FOLLOW_UP_NEEDED\"\n\n\
             Otherwise, craft ONE follow-up question that:\n\
             - Targets the most important gap or opportunity in their response\n\
             - Uses natural, conversational language\n\
             - Encourages specific examples or technical details\n\
             - Shows active listening by referencing something they said\n\
             - Is open-ended (not yes/no)\n\n\
             Your entire response must be ONLY the follow-up question text with no additional \
             commentary. Make the question direct, concise, and specific."
        )
    }

    /// Prompt for a brief acknowledgment of a substantive response.
    pub fn acknowledgment(question: &str, category: &str, response: &str) -> String {
        format!(
            "As an expert technical interviewer, create a brief, natural acknowledgment for \
             the candidate's response.\n\n\
             Question: \"{question}\"\n\
             Category: {category}\n\
             Candidate response: \"{response}\"\n\n\
             Your acknowledgment should:\n\
             1. Be 1-2 short sentences maximum\n\
             2. Reference specific content from their response\n\
             3. Sound natural and conversational (not formulaic)\n\
             4. Avoid generic phrases like \"Thank you for sharing that\"\n\
             5. Show active listening and engagement with what they said\n\
             6. NOT evaluate or judge their response quality\n\
             7. NOT ask any questions\n\n\
             Return ONLY the acknowledgment text with no additional commentary."
        )
    }

    /// Prompt answering a question the candidate asked, grounded in the
    /// company and job profile plus recent conversation.
    pub fn candidate_question(
        context: &InterviewContext,
        question_text: &str,
        conversation_context: &str,
    ) -> String {
        format!(
            "You are an interviewer for {company} interviewing for a {title} role.\n\n\
             The candidate has asked: \"{question_text}\"\n\n\
             Context about the company:\n{company_description}\n{values}\n\n\
             Job details:\n{job_description}\n{skills}\n\n\
             Prior conversation context:\n{conversation_context}\n\
             Respond naturally and conversationally to their question without forced phrasing \
             like \"That's a good question.\"\n\
             Keep your answer concise but informative.",
            company = context.company.name,
            title = context.job.title,
            company_description = context.company.description,
            values = context.company.values,
            job_description = context.job.description,
            skills = context.job.required_skills.join(", "),
        )
    }

    /// Prompt for the end-of-interview summary, structured as JSON.
    pub fn summary(
        context: &InterviewContext,
        responses: &[ResponseRecord],
        memory: &ConversationMemory,
        early_termination: bool,
    ) -> String {
        let skills_list = context
            .job
            .required_skills
            .iter()
            .map(|s| format!("'{s}'"))
            .collect::<Vec<_>>()
            .join(", ");

        let mut prompt = format!(
            "You are an experienced hiring manager for {company} with 15+ years of technical \
             interviewing expertise. You have just completed an interview with {candidate} for \
             the {title} position.\n\n\
             Job Requirements:\n{job_description}\n\n\
             Required Skills: {skills}\n\n\
             Company Values:\n{values}\n\n\
             Interview Questions and Responses:\n",
            company = context.company.name,
            candidate = context.candidate.name,
            title = context.job.title,
            job_description = context.job.description,
            skills = context.job.required_skills.join(", "),
            values = context.company.values,
        );

        for record in responses {
            prompt.push_str(&format!(
                "\nQuestion {}: {}\nResponse: {}\n",
                record.question_index + 1,
                record.question,
                record.response
            ));
            if record.is_duplicate {
                prompt.push_str("Note: This response was very similar to a previous answer.\n");
            }
        }

        prompt.push_str("\nCandidate Insights:\n");
        let topics = memory.recent_topics();
        if !topics.is_empty() {
            prompt.push_str(&format!("- Topics mentioned: {}\n", topics.join(", ")));
        }
        if let Some(style) = memory.dominant_style() {
            prompt.push_str(&format!("- Communication style: {style}\n"));
        }
        if early_termination {
            prompt.push_str("- Note: the interview was terminated early.\n");
        }

        prompt.push_str(&format!(
            "\nBased on the above interview, provide a comprehensive and specific evaluation \
             including:\n\
             1. Key strengths (3-5) demonstrated by the candidate, each with evidence from \
                their responses\n\
             2. Areas for improvement or exploration (2-4) with specific development \
                suggestions\n\
             3. Technical skill assessment against each of these required skills: \
                {skills_list}. Rate their proficiency in each skill \
                (Not Demonstrated, Basic, Proficient, Expert)\n\
             4. Cultural fit assessment against the company values, with evidence\n\
             5. Clear hiring recommendation with justification: Highly Recommend, Recommend, \
                Neutral, or Do Not Recommend\n\
             6. Concrete next steps for the hiring process\n\
             7. Overall assessment (2-3 paragraphs), evidence-based and balanced\n\n\
             Format the response as JSON with this structure:\n\
             ```json\n\
             {{\n\
                 \"candidate_name\": \"{candidate}\",\n\
                 \"position\": \"{title}\",\n\
                 \"strengths\": [\"...\"],\n\
                 \"areas_for_improvement\": [\"...\"],\n\
                 \"technical_evaluation\": \"...\",\n\
                 \"cultural_fit\": \"...\",\n\
                 \"recommendation\": \"...\",\n\
                 \"next_steps\": \"...\",\n\
                 \"overall_assessment\": \"...\"\n\
             }}\n\
             ```\n\
             Be specific and evidence-based, directly referencing candidate responses.",
            candidate = context.candidate.name,
            title = context.job.title,
        ));

        prompt
    }
}
